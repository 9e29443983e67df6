use std::ops::Range;

use log::{debug, warn};

use crate::{
    document::Clip,
    error::ExtractionError,
    record::{AnimFlags, AnimJoint, Frame, Joint},
    scene::{RawAnimation, Track},
};

/// How the host timeline is cut into clips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipSplit {
    /// One clip spanning the whole timeline.
    #[default]
    Whole,
    /// One clip per marker, running up to the next marker.
    Markers,
}

/// Turns the host timeline into clips of per-joint pose deltas.
///
/// Deltas are taken against each joint's rest transform. Animated joints are
/// listed in skeleton order regardless of the host's track order.
pub(crate) fn build_clips(
    joints: &[Joint],
    animation: &RawAnimation,
    split: ClipSplit,
    whole_name: &str,
) -> Result<Vec<Clip>, ExtractionError> {
    let mut tracks = resolve_tracks(joints, animation)?;
    tracks.sort_by_key(|(joint, _)| *joint);
    // one run of frames per joint and clip
    if let Some(pair) = tracks.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        return Err(ExtractionError::DuplicateTrack(pair[1].1.joint.clone()));
    }

    Ok(clip_ranges(animation, split, whole_name)
        .into_iter()
        .map(|(name, range)| build_clip(joints, &tracks, animation.frame_rate, name, range))
        .collect())
}

fn resolve_tracks<'a>(
    joints: &[Joint],
    animation: &'a RawAnimation,
) -> Result<Vec<(usize, &'a Track)>, ExtractionError> {
    animation
        .tracks
        .iter()
        .map(|track| {
            let joint = joints
                .iter()
                .position(|joint| joint.name == track.joint)
                .ok_or_else(|| ExtractionError::UnknownJoint(track.joint.clone()))?;

            if track.samples.len() != animation.frame_count {
                return Err(ExtractionError::TrackLength {
                    joint: track.joint.clone(),
                    samples: track.samples.len(),
                    expected: animation.frame_count,
                });
            }
            Ok((joint, track))
        })
        .collect()
}

fn clip_ranges(
    animation: &RawAnimation,
    split: ClipSplit,
    whole_name: &str,
) -> Vec<(String, Range<usize>)> {
    let whole = vec![(whole_name.to_owned(), 0..animation.frame_count)];
    if split == ClipSplit::Whole {
        return whole;
    }
    if animation.markers.is_empty() {
        warn!("No markers to split the animation at, exporting it as one clip");
        return whole;
    }

    let mut markers: Vec<_> = animation.markers.iter().collect();
    markers.sort_by_key(|marker| marker.frame);

    let mut ranges = Vec::new();
    for (n, marker) in markers.iter().enumerate() {
        let end = markers
            .get(n + 1)
            .map_or(animation.frame_count, |next| next.frame)
            .min(animation.frame_count);
        if marker.frame >= end {
            warn!("Marker `{}` starts an empty clip, skipping it", marker.name);
            continue;
        }
        ranges.push((marker.name.clone(), marker.frame..end));
    }
    ranges
}

fn build_clip(
    joints: &[Joint],
    tracks: &[(usize, &Track)],
    frame_rate: u32,
    name: String,
    range: Range<usize>,
) -> Clip {
    debug!("Building clip `{}` from frames {:?}", name, range);

    let mut clip = Clip::new(name, frame_rate, range.len());
    for (joint_i, track) in tracks {
        let rest = &joints[*joint_i];
        let mut anim = AnimJoint {
            joint: *joint_i,
            flags: AnimFlags::empty(),
            start_index: clip.frames.len(),
        };

        for (i, sample) in track.samples[range.clone()].iter().enumerate() {
            let frame = Frame {
                i,
                translation: [
                    sample[0] - rest.translation[0],
                    sample[1] - rest.translation[1],
                    sample[2] - rest.translation[2],
                ],
                rotation: [
                    sample[3] - rest.rotation[0],
                    sample[4] - rest.rotation[1],
                    sample[5] - rest.rotation[2],
                ],
            };
            anim.flags |= AnimFlags::of_frame(&frame);
            clip.frames.push(frame);
        }
        clip.joints.push(anim);
    }
    clip
}
