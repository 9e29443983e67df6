//! Serializes a [`Document`] to DEM text.
//!
//! ```text
//! DEM_10
//! joints <N>
//! meshes <N>
//! mesh <name>
//! mat <material>
//! verts <n>     followed by n `v` lines
//! tris <n>      followed by n `t` lines
//! weights <n>   followed by n `w` lines
//! clips <N>
//! clip <name> <frame_rate> <frame_count> <joint_count>
//!               followed by joint_count `h` lines
//! frames <n>    followed by n `f` lines
//! ```
//!
//! Only the selected [`Sections`] are written. Output is streamed; a failure
//! part way leaves whatever was already written in the sink.

use std::io::Write;

use bitflags::bitflags;

use crate::{
    document::{Document, Mesh, ANIMATION_IDENTIFIER, FORMAT_IDENTIFIER, FORMAT_VERSION},
    error::{EncodingError, FormatError, RecordLocation, Result},
    record::{check_name, Encode},
};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Sections: u8 {
        const JOINTS = 1;
        const MESHES = 1 << 1;
        const ANIMATION = 1 << 2;
        const MODEL = Self::JOINTS.bits() | Self::MESHES.bits();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterOptions {
    /// Follow `joints <N>` with one `j` line per joint.
    ///
    /// Off by default: the format has always announced the joint count
    /// without listing the joints.
    pub joint_lines: bool,
}

/// Writes the selected sections of `document` with the default options.
pub fn write<W: Write + ?Sized>(document: &Document, sink: &mut W, sections: Sections) -> Result<()> {
    write_with(document, sink, sections, WriterOptions::default())
}

pub fn write_with<W: Write + ?Sized>(
    document: &Document,
    sink: &mut W,
    sections: Sections,
    options: WriterOptions,
) -> Result<()> {
    let identifier = if sections.intersects(Sections::MODEL) {
        FORMAT_IDENTIFIER
    } else {
        ANIMATION_IDENTIFIER
    };
    writeln!(sink, "{}_{}", identifier, FORMAT_VERSION)?;

    if sections.contains(Sections::JOINTS) {
        writeln!(sink, "joints {}", document.joints.len())?;
        if options.joint_lines {
            for (i, joint) in document.joints.iter().enumerate() {
                record(sink, joint, || RecordLocation::Joint(i))?;
            }
        }
    }

    if sections.contains(Sections::MESHES) {
        writeln!(sink, "meshes {}", document.meshes.len())?;
        for mesh in &document.meshes {
            write_mesh(sink, mesh)?;
        }
    }

    if sections.contains(Sections::ANIMATION) {
        write_clips(sink, document)?;
    }

    Ok(())
}

/// Writes a whole document to a string.
pub fn to_string(document: &Document, sections: Sections, options: WriterOptions) -> Result<String> {
    let mut buffer = Vec::new();
    write_with(document, &mut buffer, sections, options)?;
    // every line is built from `String`s
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

fn write_mesh<W: Write + ?Sized>(sink: &mut W, mesh: &Mesh) -> Result<()> {
    let location = || RecordLocation::Mesh(mesh.name.clone());
    let name = check_name(&mesh.name).map_err(|source| encoding(location(), source))?;
    let material = check_name(&mesh.material).map_err(|source| encoding(location(), source))?;

    writeln!(sink, "mesh {}", name)?;
    writeln!(sink, "mat {}", material)?;

    writeln!(sink, "verts {}", mesh.vertices.len())?;
    for (index, vertex) in mesh.vertices.iter().enumerate() {
        record(sink, vertex, || RecordLocation::Vertex {
            mesh: mesh.name.clone(),
            index,
        })?;
    }

    writeln!(sink, "tris {}", mesh.triangles.len())?;
    for (index, triangle) in mesh.triangles.iter().enumerate() {
        record(sink, triangle, || RecordLocation::Triangle {
            mesh: mesh.name.clone(),
            index,
        })?;
    }

    writeln!(sink, "weights {}", mesh.weights.len())?;
    for (index, weight) in mesh.weights.iter().enumerate() {
        record(sink, weight, || RecordLocation::Weight {
            mesh: mesh.name.clone(),
            index,
        })?;
    }

    Ok(())
}

fn write_clips<W: Write + ?Sized>(sink: &mut W, document: &Document) -> Result<()> {
    writeln!(sink, "clips {}", document.clips.len())?;
    for clip in &document.clips {
        record(sink, clip, || RecordLocation::Clip(clip.name.clone()))?;

        for (index, anim) in clip.joints.iter().enumerate() {
            let location = || RecordLocation::AnimJoint {
                clip: clip.name.clone(),
                index,
            };
            let hierarchy = anim
                .resolve(&document.joints)
                .map_err(|source| encoding(location(), source))?;
            record(sink, &hierarchy, location)?;
        }

        writeln!(sink, "frames {}", clip.frames.len())?;
        for (index, frame) in clip.frames.iter().enumerate() {
            record(sink, frame, || RecordLocation::Frame {
                clip: clip.name.clone(),
                index,
            })?;
        }
    }
    Ok(())
}

fn record<W, R, L>(sink: &mut W, record: &R, location: L) -> Result<()>
where
    W: Write + ?Sized,
    R: Encode,
    L: FnOnce() -> RecordLocation,
{
    let line = record
        .encode()
        .map_err(|source| encoding(location(), source))?;
    sink.write_all(line.as_bytes())?;
    Ok(())
}

fn encoding(location: RecordLocation, source: EncodingError) -> FormatError {
    FormatError::Encoding { location, source }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        document::Clip,
        record::{AnimFlags, AnimJoint, Frame, Joint, Triangle, Vertex, Weight},
    };

    fn quad_document() -> Document {
        let mut mesh = Mesh::new("Quad");
        mesh.vertices = (0..3)
            .map(|i| Vertex {
                i,
                position: [i as f64, 0.0, 0.0],
                normal: [0.0, 0.0, 1.0],
                uv: [0.5, 0.5],
                color: [1.0, 1.0, 1.0],
            })
            .collect();
        mesh.triangles.push(Triangle {
            i: 0,
            indices: [0, 1, 2],
        });

        Document {
            meshes: vec![mesh],
            ..Document::default()
        }
    }

    #[test]
    fn test_write_model() -> Result<()> {
        let text = to_string(&quad_document(), Sections::MODEL, WriterOptions::default())?;
        assert_eq!(
            text,
            "DEM_10\n\
             joints 0\n\
             meshes 1\n\
             mesh Quad\n\
             mat lightmapped_generic\n\
             verts 3\n\
             v 0 0.0 0.0 0.0 0.0 0.0 1.0 0.5 0.5 1.0 1.0 1.0\n\
             v 1 1.0 0.0 0.0 0.0 0.0 1.0 0.5 0.5 1.0 1.0 1.0\n\
             v 2 2.0 0.0 0.0 0.0 0.0 1.0 0.5 0.5 1.0 1.0 1.0\n\
             tris 1\n\
             t 0 0 1 2\n\
             weights 0\n"
        );
        Ok(())
    }

    #[test]
    fn test_joint_count_without_lines() -> Result<()> {
        let mut document = Document::default();
        for (name, parent) in [("root", -1), ("spine", 0)] {
            document.joints.push(Joint {
                name: name.into(),
                parent,
                ..Joint::default()
            });
        }

        let text = to_string(&document, Sections::MODEL, WriterOptions::default())?;
        assert_eq!(text, "DEM_10\njoints 2\nmeshes 0\n");

        let text = to_string(&document, Sections::JOINTS, WriterOptions { joint_lines: true })?;
        assert_eq!(
            text,
            "DEM_10\n\
             joints 2\n\
             j root -1 0.0 0.0 0.0 0.0 0.0 0.0\n\
             j spine 0 0.0 0.0 0.0 0.0 0.0 0.0\n"
        );
        Ok(())
    }

    #[test]
    fn test_write_weights() -> Result<()> {
        let mut document = quad_document();
        document.meshes[0].weights = vec![
            Weight {
                i: 0,
                j: 0,
                w: 1.0,
                offset: [0.0, -1.0, 0.0],
            },
            Weight {
                i: 2,
                j: 1,
                w: 0.25,
                offset: [2.0, 0.0, 0.0],
            },
        ];

        let text = to_string(&document, Sections::MESHES, WriterOptions::default())?;
        assert!(text.ends_with("weights 2\nw 0 0 1.0 0.0 -1.0 0.0\nw 2 1 0.25 2.0 0.0 0.0\n"));
        assert!(!text.contains("joints"));
        Ok(())
    }

    #[test]
    fn test_write_animation_only() -> Result<()> {
        let mut document = Document::default();
        document.joints.push(Joint {
            name: "root".into(),
            parent: -1,
            ..Joint::default()
        });
        let mut clip = Clip::new("wave", 24, 2);
        clip.joints.push(AnimJoint {
            joint: 0,
            flags: AnimFlags::TX,
            start_index: 0,
        });
        clip.frames = vec![
            Frame::default(),
            Frame {
                i: 1,
                translation: [0.5, 0.0, 0.0],
                ..Frame::default()
            },
        ];
        document.clips.push(clip);

        let text = to_string(&document, Sections::ANIMATION, WriterOptions::default())?;
        assert_eq!(
            text,
            "DEMA_10\n\
             clips 1\n\
             clip wave 24 2 1\n\
             h root -1 1 0\n\
             frames 2\n\
             f 0 0.0 0.0 0.0 0.0 0.0 0.0\n\
             f 1 0.5 0.0 0.0 0.0 0.0 0.0\n"
        );
        Ok(())
    }

    #[test]
    fn test_encoding_error_location() {
        let mut document = quad_document();
        document.meshes[0].vertices[1].position[2] = f64::NAN;

        let mut sink = Vec::new();
        let err = write(&document, &mut sink, Sections::MODEL).unwrap_err();
        match err {
            FormatError::Encoding { location, source } => {
                assert_eq!(
                    location,
                    RecordLocation::Vertex {
                        mesh: "Quad".into(),
                        index: 1
                    }
                );
                assert!(matches!(source, EncodingError::NonFinite { field: "vz", .. }));
            }
            other => panic!("unexpected error: {}", other),
        }

        // lines before the broken vertex were already streamed
        let partial = String::from_utf8(sink).unwrap();
        assert!(partial.ends_with("v 0 0.0 0.0 0.0 0.0 0.0 1.0 0.5 0.5 1.0 1.0 1.0\n"));
    }

    #[test]
    fn test_invalid_mesh_name() {
        let mut document = quad_document();
        document.meshes[0].name = "My Quad".into();
        let err = to_string(&document, Sections::MESHES, WriterOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            FormatError::Encoding {
                location: RecordLocation::Mesh(_),
                source: EncodingError::InvalidName(_),
            }
        ));
    }

    #[test]
    fn test_idempotent() -> Result<()> {
        let document = quad_document();
        let mut first = Vec::new();
        let mut second = Vec::new();
        write(&document, &mut first, Sections::all())?;
        write(&document, &mut second, Sections::all())?;
        assert_eq!(first, second);
        Ok(())
    }

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_io_error() {
        let err = write(&quad_document(), &mut FailingSink, Sections::MODEL).unwrap_err();
        assert!(matches!(err, FormatError::IoError(_)));
    }
}
