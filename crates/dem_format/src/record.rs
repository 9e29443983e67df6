//! Line records of the DEM text format.
//!
//! Every record encodes to exactly one line: a one letter tag followed by its
//! fields, separated by single spaces and terminated by `\n`.
//!
//! ```text
//! v <i> <vx> <vy> <vz> <nx> <ny> <nz> <u> <v> <r> <g> <b>
//! j <name> <parent> <vx> <vy> <vz> <rx> <ry> <rz>
//! t <i> <v1> <v2> <v3>
//! w <i> <j> <w> <x> <y> <z>
//! h <name> <parent> <flags> <start_index>
//! f <i> <tx> <ty> <tz> <rx> <ry> <rz>
//! ```

use std::fmt::{Display, Write};

use bitflags::bitflags;

use crate::error::EncodingError;

/// Decimal places every float is rounded to before it is written.
pub const MAX_FLOAT_PRECISION: usize = 16;

/// A value that can be written as a single line of a DEM document.
pub trait Encode {
    fn encode(&self) -> Result<String, EncodingError>;
}

/// Rounds half to even at [`MAX_FLOAT_PRECISION`] decimal places.
///
/// Non-finite input is returned unchanged.
pub fn round(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.*}", MAX_FLOAT_PRECISION, value)
        .parse()
        .unwrap_or(value)
}

/// Renders a float the way it appears in a document.
///
/// The rounded value is printed as the shortest decimal that reads back to
/// it, never in exponent notation, and integral values keep a `.0` suffix.
pub fn format_float(field: &'static str, value: f64) -> Result<String, EncodingError> {
    if !value.is_finite() {
        return Err(EncodingError::NonFinite { field, value });
    }

    let mut text = round(value).to_string();
    if !text.contains('.') {
        text.push_str(".0");
    }
    Ok(text)
}

/// Names are written unquoted, so they must be a single token.
pub fn check_name(name: &str) -> Result<&str, EncodingError> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(EncodingError::InvalidName(name.to_owned()));
    }
    Ok(name)
}

struct Line(String);

impl Line {
    fn new(tag: &str) -> Self {
        Line(tag.to_owned())
    }

    fn field(mut self, value: impl Display) -> Self {
        // writing into a String can't fail
        let _ = write!(self.0, " {}", value);
        self
    }

    fn name(self, name: &str) -> Result<Self, EncodingError> {
        Ok(self.field(check_name(name)?))
    }

    fn floats(mut self, fields: &[(&'static str, f64)]) -> Result<Self, EncodingError> {
        for (field, value) in fields {
            self = self.field(format_float(*field, *value)?);
        }
        Ok(self)
    }

    fn finish(mut self) -> String {
        self.0.push('\n');
        self.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vertex {
    pub i: usize,
    pub position: [f64; 3],
    pub normal: [f64; 3],
    pub uv: [f64; 2],
    pub color: [f64; 3],
}

impl Encode for Vertex {
    fn encode(&self) -> Result<String, EncodingError> {
        let [vx, vy, vz] = self.position;
        let [nx, ny, nz] = self.normal;
        let [u, v] = self.uv;
        let [r, g, b] = self.color;

        Ok(Line::new("v")
            .field(self.i)
            .floats(&[
                ("vx", vx),
                ("vy", vy),
                ("vz", vz),
                ("nx", nx),
                ("ny", ny),
                ("nz", nz),
                ("u", u),
                ("v", v),
                ("r", r),
                ("g", g),
                ("b", b),
            ])?
            .finish())
    }
}

/// A triangle of vertex indices; `i` is the index of the polygon it was cut from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Triangle {
    pub i: usize,
    pub indices: [usize; 3],
}

impl Encode for Triangle {
    fn encode(&self) -> Result<String, EncodingError> {
        let [v1, v2, v3] = self.indices;
        Ok(Line::new("t")
            .field(self.i)
            .field(v1)
            .field(v2)
            .field(v3)
            .finish())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Joint {
    pub name: String,
    /// Index of the parent joint, `-1` for roots.
    pub parent: i32,
    pub translation: [f64; 3],
    pub rotation: [f64; 3],
}

impl Encode for Joint {
    fn encode(&self) -> Result<String, EncodingError> {
        let [vx, vy, vz] = self.translation;
        let [rx, ry, rz] = self.rotation;
        Ok(Line::new("j")
            .name(&self.name)?
            .field(self.parent)
            .floats(&[
                ("vx", vx),
                ("vy", vy),
                ("vz", vz),
                ("rx", rx),
                ("ry", ry),
                ("rz", rz),
            ])?
            .finish())
    }
}

/// Influence of joint `j` on vertex `i`, with the vertex position in joint space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Weight {
    pub i: usize,
    pub j: usize,
    pub w: f64,
    pub offset: [f64; 3],
}

impl Encode for Weight {
    fn encode(&self) -> Result<String, EncodingError> {
        let [x, y, z] = self.offset;
        Ok(Line::new("w")
            .field(self.i)
            .field(self.j)
            .floats(&[("w", self.w), ("x", x), ("y", y), ("z", z)])?
            .finish())
    }
}

bitflags! {
    /// Channels a joint animates within a clip.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AnimFlags: u32 {
        const TX = 1;
        const TY = 1 << 1;
        const TZ = 1 << 2;
        const RX = 1 << 3;
        const RY = 1 << 4;
        const RZ = 1 << 5;
    }
}

impl AnimFlags {
    const CHANNELS: [AnimFlags; 6] = [
        AnimFlags::TX,
        AnimFlags::TY,
        AnimFlags::TZ,
        AnimFlags::RX,
        AnimFlags::RY,
        AnimFlags::RZ,
    ];

    /// Flags of the channels holding a non-zero delta.
    pub fn of_frame(frame: &Frame) -> Self {
        frame
            .channels()
            .iter()
            .zip(Self::CHANNELS)
            .filter(|(value, _)| **value != 0.0)
            .fold(AnimFlags::empty(), |flags, (_, channel)| flags | channel)
    }
}

/// Pose delta of one joint at frame `i` of a clip.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Frame {
    pub i: usize,
    pub translation: [f64; 3],
    pub rotation: [f64; 3],
}

impl Frame {
    pub fn channels(&self) -> [f64; 6] {
        let [tx, ty, tz] = self.translation;
        let [rx, ry, rz] = self.rotation;
        [tx, ty, tz, rx, ry, rz]
    }
}

impl Encode for Frame {
    fn encode(&self) -> Result<String, EncodingError> {
        let [tx, ty, tz] = self.translation;
        let [rx, ry, rz] = self.rotation;
        Ok(Line::new("f")
            .field(self.i)
            .floats(&[
                ("tx", tx),
                ("ty", ty),
                ("tz", tz),
                ("rx", rx),
                ("ry", ry),
                ("rz", rz),
            ])?
            .finish())
    }
}

/// A joint taking part in a clip.
///
/// `joint` indexes the document's joint list; the joint's frames are
/// `start_index..start_index + frame_count` of the clip's frame buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnimJoint {
    pub joint: usize,
    pub flags: AnimFlags,
    pub start_index: usize,
}

impl AnimJoint {
    /// Pairs this entry with the joint it references.
    pub fn resolve<'a>(&'a self, joints: &'a [Joint]) -> Result<JointHierarchy<'a>, EncodingError> {
        joints
            .get(self.joint)
            .map(|joint| JointHierarchy { joint, anim: self })
            .ok_or(EncodingError::UnknownJoint(self.joint))
    }
}

/// An [`AnimJoint`] resolved against its [`Joint`], written as an `h` line.
#[derive(Debug, Clone, Copy)]
pub struct JointHierarchy<'a> {
    pub joint: &'a Joint,
    pub anim: &'a AnimJoint,
}

impl Encode for JointHierarchy<'_> {
    fn encode(&self) -> Result<String, EncodingError> {
        Ok(Line::new("h")
            .name(&self.joint.name)?
            .field(self.joint.parent)
            .field(self.anim.flags.bits())
            .field(self.anim.start_index)
            .finish())
    }
}
