//! Derive breakpoint locations from structural variant records
//!
//! Callers describe SV breakpoints in several ways: breakend ALT notation, symbolic alleles with
//! END/CHR2 fields, and caller specific orientation tags such as STRANDS or CT. All of these are
//! reduced here to a standardized pair of Locations.
//!

use std::cmp::Ordering;

use crate::contig_order::compare_contigs;
use crate::location::{Location, Strand};
use crate::variant_record::{VariantRecord, is_breakend_allele};

/// The two breakpoint sides of an SV record
///
/// The mate is None if it could not be determined from the record.
///
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SvLocations {
    pub loc1: Location,
    pub loc2: Option<Location>,
}

/// Breakend information parsed from an ALT allele such as `N[chr2:300[`
#[derive(Debug, Eq, PartialEq)]
pub struct BndAlt {
    pub mate_chrom: String,

    /// 0-indexed mate position
    pub mate_pos: i64,

    pub is_right_end1: bool,
    pub is_right_end2: bool,
}

/// Parse a VCF breakend ALT allele
///
/// The four VCF breakend forms map to right-end states as follows:
///
/// | ALT    | breakend1 right end | breakend2 right end |
/// |--------|---------------------|---------------------|
/// | t[p[   | false               | true                |
/// | t]p]   | false               | false               |
/// | ]p]t   | true                | false               |
/// | [p[t   | true                | true                |
///
/// Returns None if the allele is not a well-formed breakend.
///
pub fn parse_bnd_alt(alt: &str) -> Option<BndAlt> {
    let first_bracket_index = alt.find(['[', ']'])?;
    let bracket = alt[first_bracket_index..].chars().next()?;
    let second_bracket_index = alt[first_bracket_index + 1..]
        .find(bracket)
        .map(|x| x + first_bracket_index + 1)?;

    let mate = &alt[first_bracket_index + 1..second_bracket_index];

    // Split on the last colon to handle contig names like "HLA-DRB1*10:01:01"
    let (mate_chrom, mate_pos) = mate.rsplit_once(':')?;
    let mate_pos = mate_pos.parse::<i64>().ok()?;
    if mate_chrom.is_empty() || mate_pos < 1 {
        return None;
    }

    Some(BndAlt {
        mate_chrom: mate_chrom.to_string(),
        mate_pos: mate_pos - 1,
        is_right_end1: first_bracket_index == 0,
        is_right_end2: bracket == '[',
    })
}

/// Parse a two character orientation code, where `left` marks a left-anchored breakend and
/// `right` marks a right end
///
fn parse_orientation_code(code: &[u8], left: u8, right: u8) -> Option<(bool, bool)> {
    let parse_side = |x: u8| {
        if x == left {
            Some(false)
        } else if x == right {
            Some(true)
        } else {
            None
        }
    };
    match code {
        [a, b, ..] => Some((parse_side(*a)?, parse_side(*b)?)),
        _ => None,
    }
}

/// Orientation from a lumpy-style STRANDS value, eg. "+-:5"
fn get_strands_orientation(strands: &str) -> Option<(bool, bool)> {
    parse_orientation_code(strands.as_bytes(), b'+', b'-')
}

/// Orientation from a delly-style CT value, eg. "3to5"
fn get_ct_orientation(ct: &str) -> Option<(bool, bool)> {
    let ct = ct.as_bytes();
    if ct.len() != 4 || &ct[1..3] != b"to" {
        return None;
    }
    parse_orientation_code(&[ct[0], ct[3]], b'3', b'5')
}

fn get_svtype_orientation(svtype: Option<&str>) -> (bool, bool) {
    match svtype {
        Some("DUP") | Some("DUP:TANDEM") => (true, false),
        Some("INV") => (false, false),
        _ => (false, true),
    }
}

/// Get the 0-indexed mate position for a non-breakend SV record
fn get_mate_pos(record: &VariantRecord, svtype: Option<&str>) -> Option<i64> {
    if let Some(end) = record
        .info_value("END")
        .and_then(|x| x.parse::<i64>().ok())
        .and_then(|x| x.checked_sub(1))
    {
        return Some(end);
    }

    let svlen = record
        .info_value("SVLEN")
        .and_then(|x| x.parse::<i64>().ok());
    match svtype {
        Some("DEL") | Some("DUP") | Some("DUP:TANDEM") | Some("INV") => {
            svlen
                .and_then(|x| x.checked_abs())
                .and_then(|x| record.pos.checked_add(x))
        }
        Some("INS") => Some(record.pos),
        _ => None,
    }
}

/// Derive the standardized breakpoint locations of an SV record
///
/// The locations are ordered so that loc1 does not follow loc2 in karyotype order. Each side's
/// right-end state is preserved when the locations are swapped, so that both records
/// describing a breakend junction produce the same location pair.
///
pub fn get_sv_locations(record: &VariantRecord) -> SvLocations {
    let svtype = record.info_value("SVTYPE");

    let bnd_alt = record
        .alt_alleles
        .iter()
        .filter(|x| is_breakend_allele(x))
        .find_map(|x| parse_bnd_alt(x));

    let (mate, (is_right_end1, is_right_end2)) = if let Some(bnd_alt) = bnd_alt {
        (
            Some((bnd_alt.mate_chrom, bnd_alt.mate_pos)),
            (bnd_alt.is_right_end1, bnd_alt.is_right_end2),
        )
    } else {
        let orientation = record
            .info_value("STRANDS")
            .and_then(get_strands_orientation)
            .or_else(|| record.info_value("CT").and_then(get_ct_orientation))
            .unwrap_or_else(|| get_svtype_orientation(svtype));

        let mate_chrom = record.info_value("CHR2").unwrap_or(&record.chrom);
        let mate = get_mate_pos(record, svtype).map(|pos| (mate_chrom.to_string(), pos));
        (mate, orientation)
    };

    let Some((mate_chrom, mate_pos)) = mate else {
        return SvLocations {
            loc1: Location::new(&record.chrom, record.pos, Strand::Forward, is_right_end1),
            loc2: None,
        };
    };

    let is_swapped = compare_contigs(&mate_chrom, &record.chrom)
        .then(mate_pos.cmp(&record.pos))
        == Ordering::Less;

    let side1 = (record.chrom.as_str(), record.pos, is_right_end1);
    let side2 = (mate_chrom.as_str(), mate_pos, is_right_end2);
    let (side1, side2) = if is_swapped {
        (side2, side1)
    } else {
        (side1, side2)
    };

    let strand2 = Strand::from_right_end_pair(side1.2, side2.2);
    SvLocations {
        loc1: Location::new(side1.0, side1.1, Strand::Forward, side1.2),
        loc2: Some(Location::new(side2.0, side2.1, strand2, side2.2)),
    }
}
