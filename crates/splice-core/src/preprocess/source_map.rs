//! Generated-offset to original-location mapping
//!
//! A [`SourceMap`] partitions the generated text into contiguous,
//! non-empty ranges. Each range names the resource it came from and where in
//! that resource it starts. Lookups binary-search the partition; an offset
//! sitting exactly on a boundary belongs to the range that starts there.

use serde::{Deserialize, Serialize};

use crate::resolve::ResourceId;

/// How offsets inside a range relate to the original text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MappingKind {
    /// Copied text; offsets advance one-for-one
    Verbatim,
    /// Generated text (comment headers, warnings, added newlines); every
    /// offset maps to the range's original start
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMapRange {
    pub generated_start: u32,
    pub generated_end: u32,
    pub resource: ResourceId,
    pub original_start: u32,
    pub kind: MappingKind,
}

impl SourceMapRange {
    pub fn len(&self) -> u32 {
        self.generated_end - self.generated_start
    }

    pub fn is_empty(&self) -> bool {
        self.generated_start == self.generated_end
    }

    pub fn contains(&self, offset: u32) -> bool {
        self.generated_start <= offset && offset < self.generated_end
    }

    /// Original offset for a generated offset inside this range
    pub fn original_offset(&self, generated: u32) -> u32 {
        match self.kind {
            MappingKind::Verbatim => self.original_start + (generated - self.generated_start),
            MappingKind::Synthetic => self.original_start,
        }
    }
}

/// Result of a source map lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub resource: ResourceId,
    pub offset: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    ranges: Vec<SourceMapRange>,
    generated_len: u32,
}

impl SourceMap {
    pub fn builder() -> SourceMapBuilder {
        SourceMapBuilder::default()
    }

    /// Map covering all of `len` bytes of one resource verbatim
    pub fn identity(resource: &ResourceId, len: u32) -> Self {
        let mut builder = Self::builder();
        builder.push_verbatim(len, resource, 0);
        builder.build()
    }

    pub fn ranges(&self) -> &[SourceMapRange] {
        &self.ranges
    }

    pub fn generated_len(&self) -> u32 {
        self.generated_len
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Owning resource and original offset for `generated`, `None` outside
    /// `[0, generated_len)`
    pub fn query(&self, generated: u32) -> Option<SourceLocation> {
        let idx = self.ranges.partition_point(|r| r.generated_end <= generated);
        let range = self.ranges.get(idx)?;
        range.contains(generated).then(|| SourceLocation {
            resource: range.resource.clone(),
            offset: range.original_offset(generated),
        })
    }

    /// Ranges overlapping `[start, end)`, in generated order
    pub fn query_range(&self, start: u32, end: u32) -> &[SourceMapRange] {
        if start >= end {
            return &[];
        }
        let first = self.ranges.partition_point(|r| r.generated_end <= start);
        let last = self.ranges.partition_point(|r| r.generated_start < end);
        &self.ranges[first..last.max(first)]
    }
}

/// Appends ranges left to right
///
/// Zero-length ranges are dropped and a verbatim range that continues the
/// previous one (same resource, adjacent original offsets) is merged into it,
/// so equal layouts always build equal maps.
#[derive(Debug, Clone, Default)]
pub struct SourceMapBuilder {
    ranges: Vec<SourceMapRange>,
    cursor: u32,
}

impl SourceMapBuilder {
    /// Generated length covered so far
    pub fn len(&self) -> u32 {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    pub fn push_verbatim(&mut self, len: u32, resource: &ResourceId, original_start: u32) -> &mut Self {
        self.push(len, resource, original_start, MappingKind::Verbatim)
    }

    pub fn push_synthetic(&mut self, len: u32, resource: &ResourceId, original_at: u32) -> &mut Self {
        self.push(len, resource, original_at, MappingKind::Synthetic)
    }

    /// Append a nested map, shifting it to the current generated offset
    pub fn splice(&mut self, nested: &SourceMap) -> &mut Self {
        for range in nested.ranges() {
            self.push(range.len(), &range.resource, range.original_start, range.kind);
        }
        self
    }

    fn push(&mut self, len: u32, resource: &ResourceId, original_start: u32, kind: MappingKind) -> &mut Self {
        if len == 0 {
            return self;
        }
        let start = self.cursor;
        self.cursor += len;

        if let Some(last) = self.ranges.last_mut()
            && kind == MappingKind::Verbatim
            && last.kind == MappingKind::Verbatim
            && last.resource == *resource
            && last.original_start + last.len() == original_start
        {
            last.generated_end = self.cursor;
            return self;
        }

        self.ranges.push(SourceMapRange {
            generated_start: start,
            generated_end: self.cursor,
            resource: resource.clone(),
            original_start,
            kind,
        });
        self
    }

    pub fn build(self) -> SourceMap {
        SourceMap {
            ranges: self.ranges,
            generated_len: self.cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> ResourceId {
        ResourceId::new("shader", "main.frag")
    }

    fn inc() -> ResourceId {
        ResourceId::new("shader", "include/inc")
    }

    /// root[0..18) header(10) inc[0..13) root[29..44)
    fn sample() -> SourceMap {
        let mut builder = SourceMap::builder();
        builder
            .push_verbatim(18, &root(), 0)
            .push_synthetic(10, &root(), 18)
            .push_verbatim(13, &inc(), 0)
            .push_verbatim(15, &root(), 29);
        builder.build()
    }

    #[test]
    fn boundary_belongs_to_range_starting_there() {
        let map = sample();
        assert_eq!(map.query(17).map(|l| l.resource), Some(root()));
        let at = map.query(28).expect("mapped");
        assert_eq!((at.resource, at.offset), (inc(), 0));
        let at = map.query(18).expect("mapped");
        assert_eq!((at.resource, at.offset), (root(), 18));
    }

    #[test]
    fn synthetic_ranges_pin_to_their_origin() {
        let map = sample();
        for offset in 18..28 {
            assert_eq!(map.query(offset).map(|l| l.offset), Some(18));
        }
    }

    #[test]
    fn verbatim_ranges_interpolate() {
        let map = sample();
        assert_eq!(map.query(35).map(|l| l.offset), Some(7));
        assert_eq!(map.query(41).map(|l| l.offset), Some(29));
        assert_eq!(map.query(55).map(|l| l.offset), Some(43));
    }

    #[test]
    fn partition_covers_every_offset_once() {
        let map = sample();
        assert_eq!(map.generated_len(), 56);
        for offset in 0..map.generated_len() {
            let owners = map.ranges().iter().filter(|r| r.contains(offset)).count();
            assert_eq!(owners, 1, "offset {offset}");
            assert!(map.query(offset).is_some());
        }
        for pair in map.ranges().windows(2) {
            assert_eq!(pair[0].generated_end, pair[1].generated_start);
        }
        assert_eq!(map.query(56), None);
    }

    #[test]
    fn query_range_returns_overlaps_in_order() {
        let map = sample();
        let hits: Vec<_> = map.query_range(10, 30).iter().map(|r| r.generated_start).collect();
        assert_eq!(hits, vec![0, 18, 28]);
        assert!(map.query_range(20, 20).is_empty());
        assert_eq!(map.query_range(28, 29).len(), 1);
        assert!(map.query_range(56, 80).is_empty());
    }

    #[test]
    fn builder_drops_empty_and_merges_adjacent_verbatim() {
        let mut builder = SourceMap::builder();
        builder
            .push_verbatim(0, &root(), 0)
            .push_verbatim(5, &root(), 0)
            .push_verbatim(5, &root(), 5)
            .push_synthetic(0, &inc(), 0);
        let map = builder.build();
        assert_eq!(map.ranges().len(), 1);
        assert_eq!(map, SourceMap::identity(&root(), 10));
    }

    #[test]
    fn splice_shifts_nested_map() {
        let nested = SourceMap::identity(&inc(), 4);
        let mut builder = SourceMap::builder();
        builder.push_synthetic(3, &root(), 0).splice(&nested);
        let map = builder.build();
        assert_eq!(map.ranges()[1].generated_start, 3);
        assert_eq!(map.query(5).map(|l| (l.resource, l.offset)), Some((inc(), 2)));
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(SourceMap::identity(&root(), 3)).expect("serialize");
        assert_eq!(json["generatedLen"], 3);
        assert_eq!(json["ranges"][0]["kind"], "verbatim");
        assert_eq!(json["ranges"][0]["resource"]["path"], "main.frag");
    }
}
