//! STL parsing (binary and ASCII) into a single-surface scene.
use nom::{
    bytes::complete::{tag, take},
    character::complete::{multispace0, multispace1, not_line_ending, space0},
    combinator::opt,
    multi::{count, many0},
    number::complete::{float, le_f32, le_u16, le_u32},
    sequence::{preceded, tuple},
    IResult,
};

use crate::geometry::{Mesh, Triangle, Vertex};
use crate::loader::AssetError;

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<Mesh, AssetError> {
    if data.len() < HEADER_LEN + 4 {
        return Err(AssetError::Parse("file too small to be a valid STL".into()));
    }

    let declared = u32::from_le_bytes([data[80], data[81], data[82], data[83]]) as usize;
    let needed = declared
        .checked_mul(FACET_LEN)
        .and_then(|n| n.checked_add(HEADER_LEN + 4));
    if needed.map_or(true, |n| data.len() < n) {
        return Err(AssetError::Parse(format!(
            "binary STL declares {declared} facets but holds {} bytes",
            data.len()
        )));
    }

    match binary_stl(data) {
        Ok((_, triangles)) => Ok(Mesh { triangles }),
        Err(e) => Err(AssetError::Parse(format!(
            "malformed binary STL: {:?}",
            e.map(|inner| inner.code)
        ))),
    }
}

fn binary_stl(input: &[u8]) -> IResult<&[u8], Vec<Triangle>> {
    let (input, _) = take(HEADER_LEN)(input)?;
    let (input, facets) = le_u32(input)?;
    count(binary_facet, facets as usize)(input)
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], Triangle> {
    let (input, n) = le_vec3(input)?;
    let (input, a) = le_vec3(input)?;
    let (input, b) = le_vec3(input)?;
    let (input, c) = le_vec3(input)?;
    // attribute byte count
    let (input, _) = le_u16(input)?;
    Ok((input, facet(n, [a, b, c])))
}

fn le_vec3(input: &[u8]) -> IResult<&[u8], (f32, f32, f32)> {
    tuple((le_f32, le_f32, le_f32))(input)
}

fn facet(normal: (f32, f32, f32), corners: [(f32, f32, f32); 3]) -> Triangle {
    let v = |(x, y, z): (f32, f32, f32)| Vertex::new(x, y, z, normal.0, normal.1, normal.2);
    Triangle::new(v(corners[0]), v(corners[1]), v(corners[2]))
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<Mesh, AssetError> {
    match ascii_stl(input) {
        Ok((_, triangles)) => Ok(Mesh { triangles }),
        Err(e) => Err(AssetError::Parse(format!(
            "malformed ASCII STL: {:?}",
            e.map(|inner| inner.code)
        ))),
    }
}

fn ascii_stl(input: &str) -> IResult<&str, Vec<Triangle>> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    // solid name, possibly empty
    let (input, _) = preceded(space0, not_line_ending)(input)?;
    let (input, triangles) = many0(ascii_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    let (input, _) = opt(preceded(space0, not_line_ending))(input)?;
    Ok((input, triangles))
}

fn ascii_facet(input: &str) -> IResult<&str, Triangle> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, normal) = ascii_vec3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, a) = ascii_vertex(input)?;
    let (input, b) = ascii_vertex(input)?;
    let (input, c) = ascii_vertex(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((input, facet(normal, [a, b, c])))
}

fn ascii_vertex(input: &str) -> IResult<&str, (f32, f32, f32)> {
    preceded(preceded(multispace0, tag("vertex")), ascii_vec3)(input)
}

fn ascii_vec3(input: &str) -> IResult<&str, (f32, f32, f32)> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, (x, y, z)))
}

/// Detect and parse STL file (binary or ASCII)
pub fn parse_stl(data: &[u8]) -> Result<Mesh, AssetError> {
    // Some exporters write "solid" into binary headers, so ASCII is only a guess
    if data.starts_with(b"solid") {
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(mesh) = parse_ascii_stl(text) {
                return Ok(mesh);
            }
        }
    }

    parse_binary_stl(data)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Binary STL bytes for the given triangles (normals zeroed).
    pub(crate) fn binary_stl_bytes(triangles: &[[[f32; 3]; 3]]) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_LEN];
        data.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
        for triangle in triangles {
            data.extend_from_slice(&[0u8; 12]);
            for corner in triangle {
                for value in corner {
                    data.extend_from_slice(&value.to_le_bytes());
                }
            }
            data.extend_from_slice(&0u16.to_le_bytes());
        }
        data
    }

    #[test]
    fn test_parse_binary_header() {
        let data = binary_stl_bytes(&[]);
        let mesh = parse_binary_stl(&data).unwrap();
        assert_eq!(mesh.triangles.len(), 0);
    }

    #[test]
    fn binary_facets_round_into_triangles() {
        let data = binary_stl_bytes(&[[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 2.0, 0.0]]]);
        let mesh = parse_stl(&data).unwrap();
        assert_eq!(mesh.triangles.len(), 1);
        assert_eq!(mesh.triangles[0].vertices[2].position.y, 2.0);
    }

    #[test]
    fn truncated_binary_is_rejected() {
        let mut data = binary_stl_bytes(&[[[0.0; 3]; 3]]);
        data.truncate(data.len() - 10);
        assert!(matches!(parse_binary_stl(&data), Err(AssetError::Parse(_))));
    }

    #[test]
    fn huge_declared_count_is_rejected() {
        let mut data = vec![0u8; 84];
        data[80..84].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(parse_binary_stl(&data).is_err());
    }

    #[test]
    fn named_ascii_solid() {
        let text = "solid wedge\n\
            facet normal 0 0 1\n\
              outer loop\n\
                vertex 0 0 0\n\
                vertex 1 0 0\n\
                vertex 0 1 0\n\
              endloop\n\
            endfacet\n\
            endsolid wedge\n";
        let mesh = parse_stl(text.as_bytes()).unwrap();
        assert_eq!(mesh.triangles.len(), 1);
        assert_eq!(mesh.triangles[0].vertices[0].normal.z, 1.0);
    }
}
