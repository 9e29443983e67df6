use std::fs;
use std::io::{self, BufRead};
use std::{num, path::Path};

use log::debug;

use super::builder::*;

#[derive(thiserror::Error, Debug)]
pub enum ParserError {
    #[error("Failed to parse float.")]
    ParseFloat(#[from] num::ParseFloatError),
    #[error("Failed to parse integer.")]
    ParseInt(#[from] num::ParseIntError),
    #[error("Failed to read model.")]
    Io(#[from] io::Error),
    #[error("Failed to parse face.")]
    ParseFace,
    #[error("Expected {expected} numbers, found {found}.")]
    MissingValues { expected: usize, found: usize },
    #[error("Line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: Box<ParserError>,
    },
}

// parses wavefront obj (https://en.wikipedia.org/wiki/Wavefront_.obj_file)
// every `o` starts a new mesh object, groups stay part of the current object
pub(crate) fn parse(filepath: &Path, settings: ObjSettings) -> Result<ObjScene, ParserError> {
    let name = filepath
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("mesh");

    let reader = read_lines(filepath)?;
    log::info!("Loading mesh: {}", filepath.display());

    parse_lines(reader, name, settings)
}

pub(crate) fn parse_lines<B: BufRead>(
    reader: B,
    default_name: &str,
    settings: ObjSettings,
) -> Result<ObjScene, ParserError> {
    let mut builder = ObjSceneBuilder::new(default_name, settings);

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        debug!("Parsing: \"{}\"", line);

        let (token, value) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        parse_token(token, value.trim(), &mut builder).map_err(|source| ParserError::Line {
            line: number + 1,
            source: Box::new(source),
        })?;
    }

    Ok(builder.build_scene())
}

fn parse_token(token: &str, value: &str, builder: &mut ObjSceneBuilder) -> Result<(), ParserError> {
    match token {
        // comment
        "#" => debug!("Comment: {:?}", value),
        // material
        "mtllib" => log::warn!(".mtl materials are not supported. Ignoring."),
        // object (mesh)
        "o" => builder.set_object(value),
        // group
        "g" => debug!("Group {:?} stays part of the current object", value),
        // vertex
        "v" => builder.push_vertex(parse_vertex(value)?),
        // texture coordinates
        "vt" => builder.push_uv(parse_uv(value)?),
        // vertex normals
        "vn" => builder.push_normal(parse_normal(value)?),
        // parameter space vertices
        "vp" => log::warn!("Parameter space vertices not supported. Ignoring."),
        "f" => builder.push_face(parse_face(value)?),
        // material
        "usemtl" => log::warn!("Materials not supported. Ignoring."),
        // smothing groups
        "s" => debug!("Smoothing groups not supported. Ignoring."),
        _ if token.starts_with('#') => debug!("Comment: {:?}", value),
        _ => log::error!("Found invalid token: \"{}\"", token),
    };

    Ok(())
}

fn parse_vertex(value: &str) -> Result<ObjVertex, ParserError> {
    let vec = parse_numbers(value, 3)?;

    // check for colors
    let mut color = None;
    if vec.len() == 6 {
        color = Some([vec[3], vec[4], vec[5]]);
    }

    Ok(ObjVertex {
        position: [vec[0], vec[1], vec[2]],
        color,
    })
}

fn parse_normal(value: &str) -> Result<[f32; 3], ParserError> {
    let numbers = parse_numbers(value, 3)?;
    Ok([numbers[0], numbers[1], numbers[2]])
}

fn parse_uv(value: &str) -> Result<[f32; 2], ParserError> {
    let numbers = parse_numbers(value, 2)?;
    Ok([numbers[0], numbers[1]])
}

// parses at least `expected` numbers seperated by whitespace
fn parse_numbers(value: &str, expected: usize) -> Result<Vec<f32>, ParserError> {
    let numbers = value
        .split_whitespace()
        .map(|x| x.parse())
        .collect::<Result<Vec<f32>, _>>()?;

    if numbers.len() < expected {
        return Err(ParserError::MissingValues {
            expected,
            found: numbers.len(),
        });
    }
    Ok(numbers)
}

// parses triples/face indexes sperated by whitespace, which are itself seperated by slashes
fn parse_face(value: &str) -> Result<ObjFace, ParserError> {
    let face_indexes: Result<Vec<ObjFaceIndex>, _> = value
        .split_whitespace()
        .map(parse_face_index)
        .collect::<Result<_, _>>();
    Ok(ObjFace {
        face_i: face_indexes?,
    })
}

// parses a single face index seperated by slashes
fn parse_face_index(value: &str) -> Result<ObjFaceIndex, ParserError> {
    let triplet = parse_triplet(value)?;

    Ok(ObjFaceIndex {
        vert_i: triplet[0].ok_or(ParserError::ParseFace)?,
        uv_i: triplet[1],
        normal_i: triplet[2],
    })
}

// parse a triplet seperated by slashes
fn parse_triplet(value: &str) -> Result<Vec<Option<usize>>, num::ParseIntError> {
    let mut ret = vec![None; 3];

    for (a, b) in ret.iter_mut().zip(value.split('/')) {
        *a = if b.is_empty() { None } else { Some(b.parse()?) }
    }

    Ok(ret)
}

// Returns a buffered reader of the file.
fn read_lines<P>(filename: P) -> io::Result<io::BufReader<fs::File>>
where
    P: AsRef<Path>,
{
    let file = fs::File::open(filename)?;
    Ok(io::BufReader::new(file))
}

#[cfg(test)]
mod test {
    use super::*;
    use dem_format::scene::{HostScene, ObjectKind};
    use std::num::ParseIntError;

    #[test]
    fn test_parse_token() -> Result<(), ParserError> {
        let mut builder = ObjSceneBuilder::new("crate", ObjSettings::default());

        parse_token("o", "foo bar", &mut builder)?;
        parse_token("v", "1 2 3", &mut builder)?;
        parse_token("v", "4 5 6", &mut builder)?;
        parse_token("f", "1 2 2", &mut builder)?;
        parse_token("g", "new group", &mut builder)?;

        assert_eq!(builder.curr_object.name, "foo_bar");
        assert_eq!(builder.curr_object.faces.len(), 1);
        assert_eq!(
            builder.data.vertices,
            vec![
                ObjVertex {
                    position: [1.0, 2.0, 3.0],
                    ..ObjVertex::default()
                },
                ObjVertex {
                    position: [4.0, 5.0, 6.0],
                    ..ObjVertex::default()
                }
            ]
        );

        Ok(())
    }

    #[test]
    fn test_flip_axis() -> Result<(), ParserError> {
        let mut builder = ObjSceneBuilder::new(
            "crate",
            ObjSettings {
                flip_axis: [false, false, true],
                ..ObjSettings::default()
            },
        );

        parse_token("v", "1 2 3", &mut builder)?;
        parse_token("vn", "0 0 1", &mut builder)?;

        assert_eq!(builder.data.vertices[0].position, [1.0, 2.0, -3.0]);
        assert_eq!(builder.data.normals[0], [0.0, 0.0, -1.0]);
        Ok(())
    }

    #[test]
    fn test_parse_vertex() -> Result<(), ParserError> {
        assert_eq!(
            parse_vertex("1 1 1 1 2 3")?,
            ObjVertex {
                position: [1.0, 1.0, 1.0],
                color: Some([1.0, 2.0, 3.0])
            }
        );
        assert_eq!(
            parse_vertex("1 1 1 1")?,
            ObjVertex {
                position: [1.0, 1.0, 1.0],
                ..ObjVertex::default()
            }
        );
        assert!(matches!(
            parse_vertex("1 1"),
            Err(ParserError::MissingValues {
                expected: 3,
                found: 2
            })
        ));

        Ok(())
    }

    #[test]
    fn test_parse_face() -> Result<(), ParserError> {
        assert_eq!(
            parse_face("1 2/2 3/2/1 5//2")?,
            ObjFace {
                face_i: vec![
                    ObjFaceIndex {
                        vert_i: 1,
                        ..ObjFaceIndex::default()
                    },
                    ObjFaceIndex {
                        vert_i: 2,
                        uv_i: Some(2),
                        ..ObjFaceIndex::default()
                    },
                    ObjFaceIndex {
                        vert_i: 3,
                        uv_i: Some(2),
                        normal_i: Some(1),
                    },
                    ObjFaceIndex {
                        vert_i: 5,
                        normal_i: Some(2),
                        ..ObjFaceIndex::default()
                    }
                ]
            }
        );
        assert!(matches!(parse_face("/2/3"), Err(ParserError::ParseFace)));
        Ok(())
    }

    #[test]
    fn test_parse_triplet() -> Result<(), ParseIntError> {
        assert_eq!(parse_triplet("1")?, &[Some(1), None, None]);
        assert_eq!(parse_triplet("1/3")?, &[Some(1), Some(3), None]);
        assert_eq!(parse_triplet("1/2/3")?, &[Some(1), Some(2), Some(3)]);
        assert_eq!(parse_triplet("1//3")?, &[Some(1), None, Some(3)]);

        Ok(())
    }

    #[test]
    fn test_parse_objects() -> Result<(), ParserError> {
        let source = "\
# two objects
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
f 1/1 2/1 3/1
o Second Mesh
v 0 0 1
v 1 0 1
v 0 1 1
f 4/1 5/1 6/1
o Empty
";
        let scene = parse_lines(source.as_bytes(), "crate", ObjSettings::default())?;
        let objects = scene.objects();

        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].name, "crate");
        assert_eq!(objects[1].name, "Second_Mesh");
        assert!(objects.iter().all(|o| o.kind == ObjectKind::Mesh));
        Ok(())
    }

    #[test]
    fn test_error_line() {
        let source = "v 0 0 0\nv 0 zero 0\n";
        let result = parse_lines(source.as_bytes(), "crate", ObjSettings::default());
        assert!(matches!(result, Err(ParserError::Line { line: 2, .. })));
    }
}
