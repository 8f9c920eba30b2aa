//! OFF-style mesh text format support
//!
//! The pipeline exchanges 3D artifacts as OFF source text: an `OFF` header
//! token, a counts line (`vertices faces [edges]`), then that many vertex
//! and face lines. Faces carry a leading per-face vertex count; quads are
//! split on the diagonal into two triangles. This decoder produces the flat
//! buffers a viewer needs; normal computation is the viewer's job.

use stepscope_core::{Error, Result, SurfaceMesh};

pub struct OffDecoder;

impl OffDecoder {
    /// Decode OFF source text into a surface mesh
    pub fn decode(raw: &str) -> Result<SurfaceMesh> {
        let lines: Vec<&str> = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect();

        if lines.first().copied() != Some("OFF") {
            return Err(Error::Format("missing OFF header".to_string()));
        }

        let counts = lines
            .get(1)
            .ok_or_else(|| Error::Format("missing counts line".to_string()))?;
        let (vertex_count, face_count) = Self::parse_counts(counts)?;

        if lines.len() < 2 + vertex_count + face_count {
            return Err(Error::Format(format!(
                "declared {} vertices and {} faces but only {} data lines present",
                vertex_count,
                face_count,
                lines.len().saturating_sub(2)
            )));
        }

        let mut vertices = Vec::with_capacity(vertex_count * 3);
        for line in &lines[2..2 + vertex_count] {
            let coords = Self::parse_floats(line, 3)?;
            vertices.extend_from_slice(&coords);
        }

        let mut triangles = Vec::with_capacity(face_count * 3);
        for line in &lines[2 + vertex_count..2 + vertex_count + face_count] {
            Self::parse_face(line, vertex_count, &mut triangles)?;
        }

        Ok(SurfaceMesh::new(vertices, triangles))
    }

    fn parse_counts(line: &str) -> Result<(usize, usize)> {
        let mut fields = line.split_whitespace();
        let vertex_count = Self::parse_usize(fields.next(), "vertex count")?;
        let face_count = Self::parse_usize(fields.next(), "face count")?;
        // A trailing edge count is legal and ignored.
        Ok((vertex_count, face_count))
    }

    fn parse_usize(field: Option<&str>, what: &str) -> Result<usize> {
        field
            .ok_or_else(|| Error::Format(format!("missing {}", what)))?
            .parse()
            .map_err(|_| Error::Format(format!("invalid {}", what)))
    }

    fn parse_floats(line: &str, n: usize) -> Result<Vec<f32>> {
        let values: Vec<f32> = line
            .split_whitespace()
            .take(n)
            .map(|field| {
                field
                    .parse::<f32>()
                    .map_err(|_| Error::Format(format!("invalid vertex coordinate: {:?}", field)))
            })
            .collect::<Result<_>>()?;
        if values.len() < n {
            return Err(Error::Format(format!("vertex line too short: {:?}", line)));
        }
        Ok(values)
    }

    fn parse_face(line: &str, vertex_count: usize, triangles: &mut Vec<u32>) -> Result<()> {
        let fields: Vec<u32> = line
            .split_whitespace()
            .map(|field| {
                field
                    .parse::<u32>()
                    .map_err(|_| Error::Format(format!("invalid face index: {:?}", field)))
            })
            .collect::<Result<_>>()?;

        let arity = *fields
            .first()
            .ok_or_else(|| Error::Format("empty face line".to_string()))? as usize;
        if fields.len() < arity + 1 {
            return Err(Error::Format(format!("face line too short: {:?}", line)));
        }
        let indices = &fields[1..arity + 1];
        if let Some(&out_of_range) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(Error::Format(format!(
                "face references vertex {} but only {} vertices declared",
                out_of_range, vertex_count
            )));
        }

        match arity {
            3 => triangles.extend_from_slice(indices),
            // Quads split on the diagonal: (v0,v1,v2) + (v0,v2,v3)
            4 => {
                triangles.extend_from_slice(&[indices[0], indices[1], indices[2]]);
                triangles.extend_from_slice(&[indices[0], indices[2], indices[3]]);
            }
            other => {
                return Err(Error::Format(format!(
                    "unsupported face with {} vertices",
                    other
                )))
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBE_OFF: &str = "OFF\n8 6 12\n\
        -1 -1 -1\n1 -1 -1\n1 1 -1\n-1 1 -1\n\
        -1 -1 1\n1 -1 1\n1 1 1\n-1 1 1\n\
        4 0 1 2 3\n4 4 5 6 7\n4 0 1 5 4\n4 2 3 7 6\n4 0 3 7 4\n4 1 2 6 5\n";

    #[test]
    fn test_cube_quads_triangulate() {
        let mesh = OffDecoder::decode(CUBE_OFF).unwrap();
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn test_quad_diagonal_split() {
        let quad = "OFF\n4 1 0\n0 0 0\n1 0 0\n1 1 0\n0 1 0\n4 0 1 2 3\n";
        let mesh = OffDecoder::decode(quad).unwrap();
        assert_eq!(mesh.triangles, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let src = "OFF\n# a comment\n\n3 1 0\n0 0 0\n1 0 0\n0 1 0\n# faces\n3 0 1 2\n";
        let mesh = OffDecoder::decode(src).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangles, vec![0, 1, 2]);
    }

    #[test]
    fn test_missing_header() {
        let result = OffDecoder::decode("3 1 0\n0 0 0\n1 0 0\n0 1 0\n3 0 1 2\n");
        assert!(matches!(result, Err(Error::Format(_))));
    }

    #[test]
    fn test_counts_exceed_lines() {
        let result = OffDecoder::decode("OFF\n5 1 0\n0 0 0\n1 0 0\n0 1 0\n3 0 1 2\n");
        assert!(matches!(result, Err(Error::Format(_))));
    }

    #[test]
    fn test_unsupported_face_arity() {
        let src = "OFF\n5 1 0\n0 0 0\n1 0 0\n1 1 0\n0 1 0\n0.5 2 0\n5 0 1 2 3 4\n";
        let result = OffDecoder::decode(src);
        assert!(matches!(result, Err(Error::Format(_))));
    }

    #[test]
    fn test_face_index_out_of_range() {
        let src = "OFF\n3 1 0\n0 0 0\n1 0 0\n0 1 0\n3 0 1 7\n";
        let result = OffDecoder::decode(src);
        assert!(matches!(result, Err(Error::Format(_))));
    }

    #[test]
    fn test_invalid_coordinate() {
        let src = "OFF\n3 1 0\n0 0 zero\n1 0 0\n0 1 0\n3 0 1 2\n";
        assert!(matches!(OffDecoder::decode(src), Err(Error::Format(_))));
    }
}
