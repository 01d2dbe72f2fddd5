//! Stable index-path addresses into the live layer hierarchy.
//!
//! An address such as `2.1.clip.0` reads: top-level layer 2, its child 1,
//! then the first layer clipped onto that child.

use std::fmt;
use std::str::FromStr;

use crate::constants::CLIP_SEGMENT;
use crate::error::VariationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Index into the current sibling list
    Index(usize),
    /// Switch into the clip-layer sublist of the current layer
    Clip,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Address(Vec<Segment>);

impl Address {
    /// Address of a top-level layer.
    pub fn root(index: usize) -> Self {
        Self(vec![Segment::Index(index)])
    }

    /// Address of the `index`-th child of this (group) layer.
    pub fn child(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Index(index));
        Self(segments)
    }

    /// Address of the `index`-th layer clipped onto this layer.
    pub fn clip(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Clip);
        segments.push(Segment::Index(index));
        Self(segments)
    }

    #[allow(dead_code)]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    #[allow(dead_code)]
    pub fn depth(&self) -> usize {
        self.0
            .iter()
            .filter(|s| matches!(s, Segment::Index(_)))
            .count()
    }

    pub fn is_clip(&self) -> bool {
        self.0.iter().any(|s| *s == Segment::Clip)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match segment {
                Segment::Index(index) => write!(f, "{}", index)?,
                Segment::Clip => f.write_str(CLIP_SEGMENT)?,
            }
        }
        Ok(())
    }
}

impl FromStr for Address {
    type Err = VariationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = Vec::new();
        for part in s.split('.') {
            let segment = if part == CLIP_SEGMENT {
                if !matches!(segments.last(), Some(Segment::Index(_))) {
                    return Err(VariationError::address(s, "clip segment must follow a layer"));
                }
                Segment::Clip
            } else {
                part.parse::<usize>()
                    .map(Segment::Index)
                    .map_err(|_| VariationError::address(s, format!("bad segment `{}`", part)))?
            };
            segments.push(segment);
        }
        if !matches!(segments.last(), Some(Segment::Index(_))) {
            return Err(VariationError::address(s, "address must end with a layer index"));
        }
        Ok(Self(segments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_nested_clip_address() {
        let address = Address::root(2).child(1).clip(0);
        assert_eq!(address.to_string(), "2.1.clip.0");
        assert_eq!(address.depth(), 3);
        assert!(address.is_clip());
    }

    #[test]
    fn test_parse_matches_builder() {
        let parsed: Address = "2.1.clip.0".parse().unwrap();
        assert_eq!(parsed, Address::root(2).child(1).clip(0));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("".parse::<Address>().is_err());
        assert!("clip.0".parse::<Address>().is_err());
        assert!("1.clip".parse::<Address>().is_err());
        assert!("1.x".parse::<Address>().is_err());
        assert!("1.clip.clip.0".parse::<Address>().is_err());
    }
}
