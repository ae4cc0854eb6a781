//! Binary container decoder: 12-byte header followed by length-prefixed chunks

use nom::{
    bytes::complete::take,
    number::complete::le_u32,
    sequence::tuple,
    IResult,
};
use tracing::debug;

use crate::error::FormatError;
use crate::scene::{self, SceneDescription};

/// "glTF" read as a little-endian u32
pub const MAGIC: u32 = 0x4654_6C67;
pub const VERSION: u32 = 2;
pub const CHUNK_JSON: u32 = 0x4E4F_534A;
pub const CHUNK_BIN: u32 = 0x004E_4942;

pub const HEADER_LEN: usize = 12;
pub const CHUNK_HEADER_LEN: usize = 8;

/// A decoded container: parsed scene plus a borrowed view of the binary chunk
#[derive(Debug)]
pub struct Container<'a> {
    pub version: u32,
    pub scene: SceneDescription,
    pub binary: &'a [u8],
}

struct Header {
    magic: u32,
    version: u32,
    length: u32,
}

struct Chunk<'a> {
    kind: u32,
    data: &'a [u8],
}

fn parse_header(input: &[u8]) -> IResult<&[u8], Header> {
    let (input, (magic, version, length)) = tuple((le_u32, le_u32, le_u32))(input)?;
    Ok((
        input,
        Header {
            magic,
            version,
            length,
        },
    ))
}

fn parse_chunk_header(input: &[u8]) -> IResult<&[u8], (u32, u32)> {
    tuple((le_u32, le_u32))(input)
}

fn parse_chunk_data(input: &[u8], length: u32) -> IResult<&[u8], &[u8]> {
    take(length)(input)
}

/// Split a container into its chunks, validating the framing
fn parse_chunks(body: &[u8]) -> Result<Vec<Chunk<'_>>, FormatError> {
    let mut chunks = Vec::new();
    let mut input = body;

    while !input.is_empty() {
        let offset = HEADER_LEN + body.len() - input.len();

        let (rest, (length, kind)) =
            parse_chunk_header(input).map_err(|_| FormatError::TruncatedChunk {
                offset,
                declared: CHUNK_HEADER_LEN,
                available: input.len(),
            })?;

        let (rest, data) =
            parse_chunk_data(rest, length).map_err(|_| FormatError::TruncatedChunk {
                offset,
                declared: length as usize,
                available: rest.len(),
            })?;

        debug!("container chunk {:#010x}, {} bytes", kind, length);
        chunks.push(Chunk { kind, data });
        input = rest;
    }

    Ok(chunks)
}

/// Parse the JSON chunk, tolerating the space or NUL padding writers append.
fn parse_scene(json: &[u8]) -> Result<SceneDescription, FormatError> {
    let end = json
        .iter()
        .rposition(|&b| b != 0 && b != b' ')
        .map_or(0, |i| i + 1);
    scene::parse(&json[..end]).map_err(FormatError::InvalidJson)
}

/// Decode a container. The binary chunk is borrowed from `data`, not copied.
pub fn decode(data: &[u8]) -> Result<Container<'_>, FormatError> {
    let (_, header) = parse_header(data).map_err(|_| {
        FormatError::InvalidHeader(format!(
            "need {} header bytes, got {}",
            HEADER_LEN,
            data.len()
        ))
    })?;

    if header.magic != MAGIC {
        return Err(FormatError::InvalidHeader(format!(
            "bad magic {:#010x}",
            header.magic
        )));
    }
    if header.version != VERSION {
        return Err(FormatError::InvalidHeader(format!(
            "unsupported version {}",
            header.version
        )));
    }

    let total = header.length as usize;
    if total < HEADER_LEN || total > data.len() {
        return Err(FormatError::TruncatedChunk {
            offset: 0,
            declared: total,
            available: data.len(),
        });
    }

    let chunks = parse_chunks(&data[HEADER_LEN..total])?;

    let json = chunks
        .iter()
        .find(|chunk| chunk.kind == CHUNK_JSON)
        .ok_or(FormatError::MissingChunk("JSON"))?;
    let binary = chunks
        .iter()
        .find(|chunk| chunk.kind == CHUNK_BIN)
        .map_or(&[][..], |chunk| chunk.data);

    let scene = parse_scene(json.data)?;

    debug!(
        version = header.version,
        json_bytes = json.data.len(),
        bin_bytes = binary.len(),
        meshes = scene.meshes.len(),
        "decoded container"
    );

    Ok(Container {
        version: header.version,
        scene,
        binary,
    })
}
