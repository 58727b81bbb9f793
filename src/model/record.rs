//! Top-level record dispatch.

use std::io::Read;

use crate::anim::Animation;
use crate::format::{ByteReader, RecordTag};
use crate::mesh::MeshData;
use crate::skeleton::Skeleton;
use crate::util::{Error, Result};

/// One decoded top-level record.
#[derive(Clone, Debug)]
pub enum Record {
    Mesh(MeshData),
    Skeleton(Skeleton),
    Animation(Animation),
    /// End-of-file marker.
    End,
}

impl Record {
    /// Read the next tagged record.
    ///
    /// Animation records are validated against `skeleton`, the skeleton
    /// decoded earlier in the same file.
    pub fn read<R: Read>(r: &mut ByteReader<R>, skeleton: Option<&Skeleton>) -> Result<Self> {
        let offset = r.position();
        let raw = r.read_u8()?;
        let tag = RecordTag::from_u8(raw).ok_or(Error::UnknownRecordTag { tag: raw, offset })?;

        let record = match tag {
            RecordTag::EndFile => Self::End,
            RecordTag::Mesh => Self::Mesh(MeshData::decode(r)?),
            RecordTag::Skeleton => Self::Skeleton(Skeleton::decode(r)?),
            RecordTag::Animation => match skeleton {
                Some(skeleton) => Self::Animation(Animation::decode(r, skeleton)?),
                None => return Err(Error::AnimationWithoutSkeleton(r.read_u8()?)),
            },
        };
        Ok(record)
    }

    /// Tag this record is stored under.
    pub fn tag(&self) -> RecordTag {
        match self {
            Self::Mesh(_) => RecordTag::Mesh,
            Self::Skeleton(_) => RecordTag::Skeleton,
            Self::Animation(_) => RecordTag::Animation,
            Self::End => RecordTag::EndFile,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_record() {
        let mut r = ByteReader::from_bytes(&[0]);
        assert!(matches!(Record::read(&mut r, None).unwrap(), Record::End));
    }

    #[test]
    fn test_unknown_tag() {
        let mut r = ByteReader::from_bytes(&[4]);
        let err = Record::read(&mut r, None).unwrap_err();
        assert!(matches!(err, Error::UnknownRecordTag { tag: 4, offset: 0 }));
    }

    #[test]
    fn test_animation_needs_skeleton() {
        let mut r = ByteReader::from_bytes(&[RecordTag::Animation as u8, 6]);
        let err = Record::read(&mut r, None).unwrap_err();
        assert!(matches!(err, Error::AnimationWithoutSkeleton(6)));
    }
}
