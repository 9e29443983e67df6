use std::{iter::Peekable, str::FromStr};

use crate::{
    document::{Clip, Document, Mesh},
    error::{FormatError, Result},
    record::{AnimFlags, AnimJoint, Frame, Joint, Triangle, Vertex, Weight},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub identifier: String,
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub header: Header,
    /// Count announced by the `joints` line, if there was one. Joints listed
    /// by `j` lines or named by `h` lines end up in `document.joints`.
    pub joint_count: Option<usize>,
    pub document: Document,
}

pub fn parse(text: &str) -> Result<ParsedDocument> {
    let mut lines = Lines::new(text);

    let (line, fields) = lines.next_line()?;
    let header = parse_header(line, &fields)?;
    let mut parsed = ParsedDocument {
        header,
        joint_count: None,
        document: Document::default(),
    };

    while let Some((line, fields)) = lines.next() {
        match fields[0] {
            "joints" => {
                let count = parse_count(line, &fields, "joints")?;
                parsed.joint_count = Some(count);
                if count > 0 && lines.peek_tag() == Some("j") {
                    for _ in 0..count {
                        let (line, fields) = lines.expect("j")?;
                        parsed.document.joints.push(parse_joint(line, &fields)?);
                    }
                }
            }
            "meshes" => {
                let count = parse_count(line, &fields, "meshes")?;
                for _ in 0..count {
                    let mesh = parse_mesh(&mut lines)?;
                    parsed.document.meshes.push(mesh);
                }
            }
            "clips" => {
                let count = parse_count(line, &fields, "clips")?;
                for _ in 0..count {
                    let clip = parse_clip(&mut lines, &mut parsed.document)?;
                    parsed.document.clips.push(clip);
                }
            }
            token => {
                return Err(FormatError::parse(
                    line,
                    format!("unexpected token `{}`", token),
                ))
            }
        }
    }

    Ok(parsed)
}

struct Lines<'a> {
    inner: Peekable<Box<dyn Iterator<Item = (usize, Vec<&'a str>)> + 'a>>,
    last: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        let inner: Box<dyn Iterator<Item = (usize, Vec<&'a str>)> + 'a> = Box::new(
            text.lines()
                .enumerate()
                .map(|(i, line)| (i + 1, line.split(' ').collect::<Vec<_>>()))
                .filter(|(_, fields)| !fields[0].is_empty()),
        );
        Self {
            inner: inner.peekable(),
            last: 0,
        }
    }

    fn next(&mut self) -> Option<(usize, Vec<&'a str>)> {
        let next = self.inner.next();
        if let Some((line, _)) = &next {
            self.last = *line;
        }
        next
    }

    fn next_line(&mut self) -> Result<(usize, Vec<&'a str>)> {
        let last = self.last;
        self.next()
            .ok_or_else(|| FormatError::parse(last + 1, "unexpected end of document"))
    }

    fn peek_tag(&mut self) -> Option<&'a str> {
        self.inner.peek().map(|(_, fields)| fields[0])
    }

    fn expect(&mut self, tag: &str) -> Result<(usize, Vec<&'a str>)> {
        let (line, fields) = self.next_line()?;
        if fields[0] != tag {
            return Err(FormatError::parse(
                line,
                format!("expected `{}`, found `{}`", tag, fields[0]),
            ));
        }
        Ok((line, fields))
    }

    fn expect_count(&mut self, tag: &str) -> Result<usize> {
        let (line, fields) = self.expect(tag)?;
        parse_count(line, &fields, tag)
    }
}

fn parse_header(line: usize, fields: &[&str]) -> Result<Header> {
    let (identifier, version) = fields
        .first()
        .and_then(|token| token.split_once('_'))
        .filter(|_| fields.len() == 1)
        .ok_or_else(|| FormatError::parse(line, "invalid header"))?;

    Ok(Header {
        identifier: identifier.to_owned(),
        version: number(line, version)?,
    })
}

fn number<T: FromStr>(line: usize, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| FormatError::parse(line, format!("invalid number `{}`", value)))
}

fn arity(line: usize, fields: &[&str], count: usize) -> Result<()> {
    if fields.len() != count {
        return Err(FormatError::parse(
            line,
            format!(
                "`{}` takes {} fields, found {}",
                fields[0],
                count - 1,
                fields.len() - 1
            ),
        ));
    }
    Ok(())
}

fn floats<const N: usize>(line: usize, fields: &[&str]) -> Result<[f64; N]> {
    let mut values = [0.0; N];
    for (value, field) in values.iter_mut().zip(fields) {
        *value = number(line, field)?;
    }
    Ok(values)
}

fn parse_count(line: usize, fields: &[&str], tag: &str) -> Result<usize> {
    arity(line, fields, 2)?;
    debug_assert_eq!(fields[0], tag);
    number(line, fields[1])
}

fn parse_vertex(line: usize, fields: &[&str]) -> Result<Vertex> {
    arity(line, fields, 13)?;
    let values: [f64; 11] = floats(line, &fields[2..])?;
    Ok(Vertex {
        i: number(line, fields[1])?,
        position: [values[0], values[1], values[2]],
        normal: [values[3], values[4], values[5]],
        uv: [values[6], values[7]],
        color: [values[8], values[9], values[10]],
    })
}

fn parse_triangle(line: usize, fields: &[&str]) -> Result<Triangle> {
    arity(line, fields, 5)?;
    Ok(Triangle {
        i: number(line, fields[1])?,
        indices: [
            number(line, fields[2])?,
            number(line, fields[3])?,
            number(line, fields[4])?,
        ],
    })
}

fn parse_joint(line: usize, fields: &[&str]) -> Result<Joint> {
    arity(line, fields, 9)?;
    let values: [f64; 6] = floats(line, &fields[3..])?;
    Ok(Joint {
        name: fields[1].to_owned(),
        parent: number(line, fields[2])?,
        translation: [values[0], values[1], values[2]],
        rotation: [values[3], values[4], values[5]],
    })
}

fn parse_weight(line: usize, fields: &[&str]) -> Result<Weight> {
    arity(line, fields, 7)?;
    let values: [f64; 4] = floats(line, &fields[3..])?;
    Ok(Weight {
        i: number(line, fields[1])?,
        j: number(line, fields[2])?,
        w: values[0],
        offset: [values[1], values[2], values[3]],
    })
}

fn parse_frame(line: usize, fields: &[&str]) -> Result<Frame> {
    arity(line, fields, 8)?;
    let values: [f64; 6] = floats(line, &fields[2..])?;
    Ok(Frame {
        i: number(line, fields[1])?,
        translation: [values[0], values[1], values[2]],
        rotation: [values[3], values[4], values[5]],
    })
}

fn parse_mesh(lines: &mut Lines) -> Result<Mesh> {
    let (line, fields) = lines.expect("mesh")?;
    arity(line, &fields, 2)?;
    let mut mesh = Mesh::new(fields[1]);

    let (line, fields) = lines.expect("mat")?;
    arity(line, &fields, 2)?;
    mesh.material = fields[1].to_owned();

    for _ in 0..lines.expect_count("verts")? {
        let (line, fields) = lines.expect("v")?;
        mesh.vertices.push(parse_vertex(line, &fields)?);
    }
    for _ in 0..lines.expect_count("tris")? {
        let (line, fields) = lines.expect("t")?;
        mesh.triangles.push(parse_triangle(line, &fields)?);
    }
    for _ in 0..lines.expect_count("weights")? {
        let (line, fields) = lines.expect("w")?;
        mesh.weights.push(parse_weight(line, &fields)?);
    }

    Ok(mesh)
}

/// Joints named by `h` lines that aren't in the document yet are appended to it.
fn parse_clip(lines: &mut Lines, document: &mut Document) -> Result<Clip> {
    let (line, fields) = lines.expect("clip")?;
    arity(line, &fields, 5)?;
    let mut clip = Clip::new(
        fields[1],
        number(line, fields[2])?,
        number(line, fields[3])?,
    );
    let joint_count: usize = number(line, fields[4])?;

    for _ in 0..joint_count {
        let (line, fields) = lines.expect("h")?;
        arity(line, &fields, 5)?;
        let name = fields[1];
        let parent = number(line, fields[2])?;
        let joint = match document.joint_index(name) {
            Some(joint) => joint,
            None => {
                document.joints.push(Joint {
                    name: name.to_owned(),
                    parent,
                    ..Joint::default()
                });
                document.joints.len() - 1
            }
        };
        let flags: u32 = number(line, fields[3])?;
        clip.joints.push(AnimJoint {
            joint,
            flags: AnimFlags::from_bits_truncate(flags),
            start_index: number(line, fields[4])?,
        });
    }

    for _ in 0..lines.expect_count("frames")? {
        let (line, fields) = lines.expect("f")?;
        clip.frames.push(parse_frame(line, &fields)?);
    }

    Ok(clip)
}
