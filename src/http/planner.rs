use std::fmt;

use super::{TransferMode, info::HttpDownloadInfo};

/// Inclusive `[start, end]` span of file offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub(crate) fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// `None` unless `start <= end`.
    pub fn try_new(start: u64, end: u64) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Number of bytes covered. An inverted range covers nothing.
    pub fn len(&self) -> u64 {
        self.end.checked_sub(self.start).map_or(0, |span| span + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Ordered, contiguous ranges covering `[0, total_size - 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    ranges: Vec<ByteRange>,
}

impl ChunkPlan {
    /// Splits `total_size` into `chunk_count` ranges. Every range is `total_size / chunk_count`
    /// bytes long except the last, which also takes the remainder.
    ///
    /// `chunk_count` is clamped to `total_size` so that no range is empty. A zero
    /// `total_size` yields an empty plan.
    pub fn new(total_size: u64, chunk_count: u64) -> Self {
        if total_size == 0 {
            return Self { ranges: vec![] };
        }
        let count = chunk_count.clamp(1, total_size);
        let base = total_size / count;
        let ranges = (0..count)
            .map(|index| {
                let start = index * base;
                let end = if index == count - 1 {
                    total_size - 1
                } else {
                    start + base - 1
                };
                ByteRange::new(start, end)
            })
            .collect();
        Self { ranges }
    }

    pub fn ranges(&self) -> &[ByteRange] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn total_len(&self) -> u64 {
        self.ranges.iter().map(ByteRange::len).sum()
    }
}

pub(super) fn determine_mode(tasks_count: u8, info: &HttpDownloadInfo) -> TransferMode {
    match (info.content_length(), info.accepts_ranges()) {
        (None, _) => TransferMode::Stream,
        (Some(_), false) => TransferMode::Single,
        (Some(_), true) if tasks_count == 1 => TransferMode::Single,
        (Some(_), true) => TransferMode::Split,
    }
}

pub(super) fn chunk_count(mode: TransferMode, tasks_count: u8, content_length: Option<u64>) -> u64 {
    match (mode, content_length) {
        (TransferMode::Split, Some(length)) => (tasks_count as u64).min(length),
        (_, Some(0)) => 0,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partitions(plan: &ChunkPlan, total_size: u64) {
        let ranges = plan.ranges();
        assert_eq!(ranges.first().map(|r| r.start), Some(0));
        assert_eq!(ranges.last().map(|r| r.end), Some(total_size - 1));
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end + 1, pair[1].start);
        }
        assert_eq!(plan.total_len(), total_size);
    }

    #[test]
    fn thousand_bytes_in_three_chunks() {
        let plan = ChunkPlan::new(1000, 3);
        assert_eq!(
            plan.ranges(),
            &[
                ByteRange::new(0, 333),
                ByteRange::new(334, 666),
                ByteRange::new(667, 999)
            ]
        );
    }

    #[test]
    fn last_chunk_absorbs_remainder() {
        let plan = ChunkPlan::new(1003, 4);
        let lens: Vec<u64> = plan.ranges().iter().map(ByteRange::len).collect();
        assert_eq!(lens, vec![250, 250, 250, 253]);
    }

    #[test]
    fn plans_partition_for_many_sizes() {
        for total_size in [1u64, 2, 7, 8, 9, 100, 1000, 4096, 65_537] {
            for chunk_count in 1..=16u64 {
                let plan = ChunkPlan::new(total_size, chunk_count);
                assert_eq!(plan.len() as u64, chunk_count.min(total_size));
                assert_partitions(&plan, total_size);
            }
        }
    }

    #[test]
    fn tiny_file_never_gets_empty_ranges() {
        let plan = ChunkPlan::new(3, 8);
        assert_eq!(plan.len(), 3);
        assert!(plan.ranges().iter().all(|r| r.len() == 1));
    }

    #[test]
    fn empty_file_has_no_ranges() {
        assert!(ChunkPlan::new(0, 8).is_empty());
    }

    #[test]
    fn inverted_range_is_rejected_and_has_no_length() {
        assert_eq!(ByteRange::try_new(10, 9), None);
        assert_eq!(ByteRange::try_new(9, 9).map(|r| r.len()), Some(1));
        let inverted = ByteRange { start: 10, end: 9 };
        assert_eq!(inverted.len(), 0);
        assert!(inverted.is_empty());
        assert_eq!(ByteRange::new(0, u64::MAX - 1).len(), u64::MAX);
    }

    #[test]
    fn range_header_is_inclusive() {
        assert_eq!(ByteRange::new(334, 666).header_value(), "bytes=334-666");
    }

    #[test]
    fn unknown_size_streams_with_one_chunk() {
        let info = HttpDownloadInfo::default().set_accepts_ranges(true);
        let mode = determine_mode(8, &info);
        assert_eq!(mode, TransferMode::Stream);
        assert_eq!(chunk_count(mode, 8, None), 1);
    }

    #[test]
    fn no_accept_ranges_means_one_chunk() {
        let info = HttpDownloadInfo::default().set_content_length(Some(1000));
        let mode = determine_mode(8, &info);
        assert_eq!(mode, TransferMode::Single);
        assert_eq!(chunk_count(mode, 8, Some(1000)), 1);
    }

    #[test]
    fn advertised_ranges_split_into_tasks_count() {
        let info = HttpDownloadInfo::default()
            .set_content_length(Some(1000))
            .set_accepts_ranges(true);
        let mode = determine_mode(8, &info);
        assert_eq!(mode, TransferMode::Split);
        assert_eq!(chunk_count(mode, 8, Some(1000)), 8);
        assert_eq!(chunk_count(mode, 8, Some(5)), 5);
    }
}
