use std::fmt;

/// Strand of a breakend relative to its partner
///
/// In a breakend pair, the second breakend is `Forward` when the two sides are joined
/// without inverting either sequence.
///
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    /// Strand implied for the second breakend of a pair given the right-end state of both sides
    ///
    pub fn from_right_end_pair(is_right_end1: bool, is_right_end2: bool) -> Self {
        if is_right_end1 != is_right_end2 {
            Strand::Forward
        } else {
            Strand::Reverse
        }
    }
}

/// One side of a variant breakpoint
///
/// By convention `pos` is 0-indexed. `is_right_end` is true if the sequence retained at this
/// breakend extends to the right of `pos`, so that a simple deletion is represented by a
/// left-side Location followed by a right-end Location.
///
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Location {
    chrom: String,
    pos: i64,
    strand: Strand,
    is_right_end: bool,
}

impl Location {
    pub fn new(chrom: &str, pos: i64, strand: Strand, is_right_end: bool) -> Self {
        Self {
            chrom: chrom.to_string(),
            pos,
            strand,
            is_right_end,
        }
    }

    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    pub fn pos(&self) -> i64 {
        self.pos
    }

    pub fn strand(&self) -> Strand {
        self.strand
    }

    pub fn is_right_end(&self) -> bool {
        self.is_right_end
    }

    /// Copy of this location moved to a new position
    pub fn with_pos(&self, pos: i64) -> Self {
        Self {
            pos,
            ..self.clone()
        }
    }

    /// True if `other` shares this location's chromosome and orientation
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.chrom == other.chrom
            && self.strand == other.strand
            && self.is_right_end == other.is_right_end
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let strand = match self.strand {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        };
        let side = if self.is_right_end { 'R' } else { 'L' };
        write!(f, "{}:{}{strand}{side}", self.chrom, self.pos)
    }
}
