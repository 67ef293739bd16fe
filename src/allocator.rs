//! Best-fit CIDR allocation within a parent network.
//!
//! This file contains the core allocation algorithm: given a parent network
//! and the set of already-allocated child ranges, find the free gap whose
//! size is closest to the requested block size and carve the new block out
//! of the network-aligned center of that gap. The same allocator is used at
//! both hierarchy levels (pools within an address pool, subnets within a
//! pool); only the caller's choice of parent and children differs.
//!
//! Allocators are rebuilt from the current child list on every use via
//! [`RangeAllocator::from_children`] and hold no durable state. They never
//! log or perform I/O; exhaustion is signaled as `None` and rendered by the
//! caller.

use crate::cidr::{AddrRange, Cidr};

/// Per-parent best-fit allocator over an ordered, merged set of used ranges.
#[derive(Debug, Clone)]
pub struct RangeAllocator {
    parent: Cidr,
    used: Vec<AddrRange>,
}

impl RangeAllocator {
    /// Create an allocator for a parent network with no used ranges.
    pub fn new(parent: Cidr) -> Self {
        RangeAllocator {
            parent,
            used: Vec::new(),
        }
    }

    /// Build an allocator reflecting the current children of a parent.
    ///
    /// This is the intended construction path for callers that persist the
    /// child list elsewhere: rebuild fresh immediately before each decision
    /// rather than caching allocator instances across operations.
    pub fn from_children<I>(parent: Cidr, children: I) -> Self
    where
        I: IntoIterator<Item = Cidr>,
    {
        let mut allocator = RangeAllocator::new(parent);
        for child in children {
            allocator.add_used_range(&child);
        }
        allocator
    }

    /// The parent network this allocator carves from.
    pub fn parent(&self) -> &Cidr {
        &self.parent
    }

    /// The merged used-range set, sorted by start.
    pub fn used_ranges(&self) -> &[AddrRange] {
        &self.used
    }

    /// Record a CIDR as used.
    ///
    /// The range is inserted in sorted position and the whole set is
    /// re-merged, absorbing overlapping and adjacent ranges. Adding the same
    /// ranges in any order yields the same merged set, and re-adding a range
    /// already covered changes nothing.
    pub fn add_used_range(&mut self, cidr: &Cidr) {
        let range = cidr.range();
        let idx = self.used.partition_point(|r| r < &range);
        self.used.insert(idx, range);
        self.merge_ranges();
    }

    /// Single merge pass over the sorted set, joining ranges that overlap
    /// or sit immediately adjacent (`end + 1 == next.start`).
    fn merge_ranges(&mut self) {
        let mut merged: Vec<AddrRange> = Vec::with_capacity(self.used.len());
        for range in self.used.drain(..) {
            match merged.last_mut() {
                Some(last) if u64::from(last.end) + 1 >= u64::from(range.start) => {
                    last.end = last.end.max(range.end);
                }
                _ => merged.push(range),
            }
        }
        self.used = merged;
    }

    /// Check whether a CIDR overlaps no used range.
    ///
    /// Containment in the parent is not checked here; that is a caller
    /// policy decision.
    pub fn is_available(&self, cidr: &Cidr) -> bool {
        let range = cidr.range();
        self.used.iter().all(|used| !range.intersects(used))
    }

    /// Find and record a best-fit block of the given prefix length.
    ///
    /// Candidate gaps are scanned left to right: the free stretch before the
    /// first used range, each stretch between consecutive used ranges, and
    /// the stretch after the last one (the whole parent when nothing is
    /// used). Among gaps large enough to hold the block, the one wasting the
    /// fewest addresses wins, first-scanned on ties. The block is placed at
    /// the network-aligned center of the winning gap, snapped forward or
    /// backward as needed to stay inside it.
    ///
    /// Returns `None` when no gap qualifies, or when alignment snapping
    /// cannot produce a block inside the chosen gap. A successful call
    /// immediately records the block as used, so a sequence of calls against
    /// one allocator never overlaps itself.
    pub fn find_best_fit(&mut self, prefix_length: u8) -> Option<Cidr> {
        if prefix_length > 32 {
            return None;
        }
        let required_size = 1u64 << (32 - u32::from(prefix_length));

        let best_gap = self
            .candidate_gaps(required_size)
            .into_iter()
            .min_by_key(|gap| gap.size() - required_size)?;

        let alloc_start = place_in_gap(&best_gap, prefix_length, required_size)?;
        // Alignment is guaranteed by place_in_gap, so new() cannot fail here
        // for a prefix already validated above.
        let cidr = Cidr::new(alloc_start, prefix_length).ok()?;

        self.add_used_range(&cidr);
        Some(cidr)
    }

    /// Enumerate free stretches at least `required_size` long, in scan order.
    fn candidate_gaps(&self, required_size: u64) -> Vec<AddrRange> {
        let parent = self.parent.range();
        let mut gaps = Vec::new();
        let mut push = |start: u32, end: u32| {
            let gap = AddrRange::new(start, end);
            if gap.size() >= required_size {
                gaps.push(gap);
            }
        };

        if self.used.is_empty() {
            push(parent.start, parent.end);
            return gaps;
        }

        let first = self.used[0];
        if first.start > parent.start {
            push(parent.start, parent.end.min(first.start - 1));
        }

        for pair in self.used.windows(2) {
            // Merged set invariant: consecutive ranges are separated by at
            // least one free address.
            push(pair[0].end + 1, pair[1].start - 1);
        }

        let last = self.used[self.used.len() - 1];
        if last.end < parent.end {
            push(last.end + 1, parent.end);
        }

        gaps
    }
}

/// Place a block of `required_size` addresses at the aligned center of a gap.
///
/// The integer midpoint of the gap is rounded down to the block boundary for
/// the prefix. If that lands before the gap, the block snaps forward to the
/// next boundary; if its end would pass the gap, it snaps backward so the end
/// meets the gap's end, re-floored to a boundary. When the snapped block
/// still does not fit inside the gap (a qualifying but misaligned gap), the
/// placement fails.
fn place_in_gap(gap: &AddrRange, prefix_length: u8, required_size: u64) -> Option<u32> {
    let shift = 32 - u32::from(prefix_length);
    let gap_start = u64::from(gap.start);
    let gap_end = u64::from(gap.end);
    let gap_size = gap_end - gap_start + 1;

    let gap_center = gap_start + gap_size / 2;
    let mut alloc_start = (gap_center >> shift) << shift;

    if alloc_start < gap_start {
        alloc_start = ((gap_start >> shift) + 1) << shift;
    }

    let mut alloc_end = alloc_start + required_size - 1;
    if alloc_end > gap_end {
        alloc_start = ((gap_end - required_size + 1) >> shift) << shift;
        alloc_end = alloc_start + required_size - 1;
    }

    if alloc_start < gap_start || alloc_end > gap_end {
        return None;
    }

    Some(alloc_start as u32)
}
