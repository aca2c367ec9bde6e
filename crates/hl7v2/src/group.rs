//! Segment groups.
//!
//! An ORU^R01 message groups its segments per patient, and within a patient per observation
//! request:
//!
//! ```text
//! PID [PV1] { OBR {OBX} }
//! ```
//!
//! A [`SegmentGroup`] is an ordered sequence of entries, each a segment or a nested group.
//! Iteration is forward-only; calling [`SegmentGroup::entries`] again starts over from the
//! first entry, which is the group's "rewind".

use crate::segments::Segment;

/// One entry of a segment group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GroupEntry {
    Segment(Segment),
    Group(SegmentGroup),
}

impl GroupEntry {
    pub fn as_segment(&self) -> Option<&Segment> {
        match self {
            GroupEntry::Segment(segment) => Some(segment),
            GroupEntry::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&SegmentGroup> {
        match self {
            GroupEntry::Group(group) => Some(group),
            GroupEntry::Segment(_) => None,
        }
    }
}

/// Ordered, rewindable sequence of segments and nested groups.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SegmentGroup {
    entries: Vec<GroupEntry>,
}

impl SegmentGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_segment(&mut self, segment: Segment) {
        self.entries.push(GroupEntry::Segment(segment));
    }

    pub fn push_group(&mut self, group: SegmentGroup) {
        self.entries.push(GroupEntry::Group(group));
    }

    /// Iterate the entries from the first one.
    pub fn entries(&self) -> std::slice::Iter<'_, GroupEntry> {
        self.entries.iter()
    }

    /// The first entry, if it is a segment.
    pub fn first_segment(&self) -> Option<&Segment> {
        self.entries.first().and_then(GroupEntry::as_segment)
    }

    /// Nested group at `index` among the nested groups only.
    pub fn group(&self, index: usize) -> Option<&SegmentGroup> {
        self.entries.iter().filter_map(GroupEntry::as_group).nth(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<GroupEntry> for SegmentGroup {
    fn from_iter<I: IntoIterator<Item = GroupEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a SegmentGroup {
    type Item = &'a GroupEntry;
    type IntoIter = std::slice::Iter<'a, GroupEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments::{ObrSegment, PidSegment};

    #[test]
    fn entries_restart_from_first() {
        let mut group = SegmentGroup::new();
        group.push_segment(Segment::Pid(PidSegment::default()));
        group.push_segment(Segment::Other("NTE".into()));

        let mut first_pass = group.entries();
        first_pass.next();
        assert_eq!(
            first_pass.next().and_then(GroupEntry::as_segment).map(Segment::name),
            Some("NTE")
        );

        let mut second_pass = group.entries();
        assert_eq!(
            second_pass.next().and_then(GroupEntry::as_segment).map(Segment::name),
            Some("PID")
        );
    }

    #[test]
    fn nested_groups_are_indexed_separately() {
        let mut report = SegmentGroup::new();
        report.push_segment(Segment::Obr(ObrSegment::default()));

        let mut group = SegmentGroup::new();
        group.push_segment(Segment::Pid(PidSegment::default()));
        group.push_group(report.clone());

        assert_eq!(group.len(), 2);
        assert_eq!(group.group(0), Some(&report));
        assert!(group.group(1).is_none());
        assert_eq!(group.first_segment().map(Segment::name), Some("PID"));
    }
}
