//! Conversion of finalized clusters into consensus output records
//!

use crate::cluster_map::variant_cluster::{
    PointConsensusCluster, SvConsensusCluster, SvInfoField, get_distinct_callers,
};
use crate::location::{Location, Strand};

pub const LOW_SUPPORT_FILTER_ID: &str = "LOWSUPPORT";

/// Reference allele used for all breakpoint records
const BREAKPOINT_REF: &str = "N";

/// SV types for which SVLEN is filled in from the breakpoint positions when no caller gave one
const SPAN_SVTYPES: [&str; 4] = ["DUP", "DUP:TANDEM", "DEL", "INV"];

#[derive(Clone, Debug)]
pub struct ConsensusSettings {
    /// Records with fewer distinct callers than this are marked LOWSUPPORT
    pub min_num_callers: usize,

    /// Report the distinct caller count on each record
    pub output_caller_count: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConsensusFilter {
    Pass,
    LowSupport,
}

impl ConsensusFilter {
    fn from_caller_count(caller_count: usize, min_num_callers: usize) -> Self {
        if caller_count < min_num_callers {
            ConsensusFilter::LowSupport
        } else {
            ConsensusFilter::Pass
        }
    }
}

/// A single merged output variant
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConsensusRecord {
    pub chrom: String,

    /// 0-indexed position
    pub pos: i64,

    pub ref_allele: String,
    pub alt_allele: String,
    pub filter: ConsensusFilter,

    /// Distinct callers, in the order they were first added to the cluster
    pub callers: Vec<String>,

    /// Distinct caller count, only set when requested in the output
    pub caller_count: Option<usize>,

    pub svtype: Option<String>,
    pub svlen: Option<String>,
}

/// Get VCF breakend REF and ALT alleles for a breakpoint pair
///
/// A mate which is not known is written as '.', so the ALT is a single breakend such as 'N.'.
///
/// Panics if the strand of `loc2` is inconsistent with the right-end states of the pair.
///
pub fn bkpt_ref_alt_from_pair(loc1: &Location, loc2: Option<&Location>) -> (String, String) {
    let alt_after = !loc1.is_right_end();

    let bkpt = match loc2 {
        None => ".".to_string(),
        Some(loc2) => {
            assert_eq!(
                loc2.strand() == Strand::Forward,
                loc1.is_right_end() != loc2.is_right_end(),
                "Inconsistent breakpoint orientation: {loc1:?} {loc2:?}"
            );
            let bracket = if loc2.is_right_end() { '[' } else { ']' };
            format!("{bracket}{}:{}{bracket}", loc2.chrom(), loc2.pos() + 1)
        }
    };

    let alt = if alt_after {
        format!("{BREAKPOINT_REF}{bkpt}")
    } else {
        format!("{bkpt}{BREAKPOINT_REF}")
    };
    (BREAKPOINT_REF.to_string(), alt)
}

fn get_caller_summary(
    callers: &[String],
    settings: &ConsensusSettings,
) -> (Vec<String>, Option<usize>, ConsensusFilter) {
    let callers = get_distinct_callers(callers);
    let filter = ConsensusFilter::from_caller_count(callers.len(), settings.min_num_callers);
    let caller_count = settings.output_caller_count.then_some(callers.len());
    (callers, caller_count, filter)
}

/// Get the consensus record for a SNV/indel cluster
///
/// The record is placed at the median position of all cluster members. Returns None if the
/// cluster was built from records without an alt allele.
///
pub fn get_point_consensus_record(
    cluster: &PointConsensusCluster,
    settings: &ConsensusSettings,
) -> Option<ConsensusRecord> {
    let allele = cluster.allele.as_ref()?;
    let (callers, caller_count, filter) = get_caller_summary(&cluster.callers, settings);
    Some(ConsensusRecord {
        chrom: cluster.location.chrom().to_string(),
        pos: cluster.median_pos,
        ref_allele: allele.ref_allele.clone(),
        alt_allele: allele.alt_allele.clone(),
        filter,
        callers,
        caller_count,
        svtype: None,
        svlen: None,
    })
}

/// Get the consensus record for an SV cluster
///
/// The record is placed at the median breakpoint positions of all cluster members.
///
pub fn get_sv_consensus_record(
    cluster: &SvConsensusCluster,
    settings: &ConsensusSettings,
) -> ConsensusRecord {
    let loc1 = cluster.location1.with_pos(cluster.median_pos1);
    let loc2 = cluster
        .location2
        .as_ref()
        .zip(cluster.median_pos2)
        .map(|(loc, pos)| loc.with_pos(pos));

    let (ref_allele, alt_allele) = bkpt_ref_alt_from_pair(&loc1, loc2.as_ref());
    let (callers, caller_count, filter) = get_caller_summary(&cluster.callers, settings);

    let svtype = cluster
        .info_medians
        .get(SvInfoField::SvType)
        .map(|x| x.to_string());
    let svlen = match cluster.info_medians.get(SvInfoField::SvLen) {
        Some(x) => Some(x.to_string()),
        None => {
            let is_span_svtype = svtype
                .as_deref()
                .is_some_and(|x| SPAN_SVTYPES.contains(&x));
            if is_span_svtype {
                loc2.as_ref().map(|x| (x.pos() - loc1.pos()).to_string())
            } else {
                None
            }
        }
    };

    ConsensusRecord {
        chrom: loc1.chrom().to_string(),
        pos: loc1.pos(),
        ref_allele,
        alt_allele,
        filter,
        callers,
        caller_count,
        svtype,
        svlen,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster_map::ClusterMap;
    use crate::cluster_map::variant_cluster::FinalizedCluster;
    use crate::variant_record::test_utils::*;

    fn settings(min_num_callers: usize) -> ConsensusSettings {
        ConsensusSettings {
            min_num_callers,
            output_caller_count: true,
        }
    }

    fn get_consensus_records(
        cluster_map: ClusterMap,
        settings: &ConsensusSettings,
    ) -> Vec<ConsensusRecord> {
        cluster_map
            .into_sorted_clusters()
            .filter_map(|x| match x {
                FinalizedCluster::Point(x) => get_point_consensus_record(&x, settings),
                FinalizedCluster::Sv(x) => Some(get_sv_consensus_record(&x, settings)),
            })
            .collect()
    }

    #[test]
    fn test_bkpt_ref_alt_from_pair() {
        let loc1 = Location::new("chr1", 99, Strand::Forward, false);
        let loc2 = Location::new("chr1", 499, Strand::Forward, true);
        assert_eq!(
            bkpt_ref_alt_from_pair(&loc1, Some(&loc2)),
            ("N".to_string(), "N[chr1:500[".to_string())
        );

        let loc1 = Location::new("chr1", 99, Strand::Forward, true);
        let loc2 = Location::new("chr3", 499, Strand::Forward, false);
        assert_eq!(bkpt_ref_alt_from_pair(&loc1, Some(&loc2)).1, "]chr3:500]N");

        let loc2 = Location::new("chr3", 499, Strand::Reverse, true);
        assert_eq!(bkpt_ref_alt_from_pair(&loc1, Some(&loc2)).1, "[chr3:500[N");

        assert_eq!(bkpt_ref_alt_from_pair(&loc1, None).1, ".N");
    }

    #[test]
    #[should_panic]
    fn test_bkpt_ref_alt_orientation_check() {
        let loc1 = Location::new("chr1", 99, Strand::Forward, false);
        let loc2 = Location::new("chr1", 499, Strand::Reverse, true);
        bkpt_ref_alt_from_pair(&loc1, Some(&loc2));
    }

    #[test]
    fn test_low_support_filter() {
        let mut cluster_map = ClusterMap::new(0, 10);
        cluster_map.add_record(&make_deletion("chr1", 1000, 2000), "a", false);
        cluster_map.add_record(&make_deletion("chr1", 1002, 2000), "b", false);
        let records = get_consensus_records(cluster_map, &settings(3));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].filter, ConsensusFilter::LowSupport);

        let mut cluster_map = ClusterMap::new(0, 10);
        cluster_map.add_record(&make_deletion("chr1", 1000, 2000), "a", false);
        cluster_map.add_record(&make_deletion("chr1", 1002, 2000), "b", false);
        let records = get_consensus_records(cluster_map, &settings(2));
        assert_eq!(records[0].filter, ConsensusFilter::Pass);
    }

    #[test]
    fn test_caller_dedup() {
        let mut cluster_map = ClusterMap::new(0, 10);
        cluster_map.add_record(&make_deletion("chr1", 1000, 2000), "a", false);
        cluster_map.add_record(&make_deletion("chr1", 1001, 2000), "a", false);
        cluster_map.add_record(&make_deletion("chr1", 1002, 2000), "b", false);
        let records = get_consensus_records(cluster_map, &settings(3));
        assert_eq!(records[0].callers, vec!["a", "b"]);
        assert_eq!(records[0].caller_count, Some(2));
        assert_eq!(records[0].filter, ConsensusFilter::LowSupport);
    }

    #[test]
    fn test_point_consensus() {
        let mut cluster_map = ClusterMap::new(0, 10);
        cluster_map.add_record(&make_record("chr1", 100, "AT", "A", &[]), "a", false);
        cluster_map.add_record(&make_record("chr1", 100, "AT", "A", &[]), "b", false);
        let mut no_alt = make_record("chr1", 200, "A", ".", &[]);
        no_alt.alt_alleles.clear();
        cluster_map.add_record(&no_alt, "a", false);

        let no_count = ConsensusSettings {
            min_num_callers: 0,
            output_caller_count: false,
        };
        let records = get_consensus_records(cluster_map, &no_count);
        assert_eq!(
            records,
            vec![ConsensusRecord {
                chrom: "chr1".to_string(),
                pos: 100,
                ref_allele: "AT".to_string(),
                alt_allele: "A".to_string(),
                filter: ConsensusFilter::Pass,
                callers: vec!["a".to_string(), "b".to_string()],
                caller_count: None,
                svtype: None,
                svlen: None,
            }]
        );
    }

    #[test]
    fn test_svlen_from_callers() {
        let mut cluster_map = ClusterMap::new(0, 10);
        let rec = make_record(
            "chr1",
            1000,
            "N",
            "<DEL>",
            &[("SVTYPE", "DEL"), ("END", "2001"), ("SVLEN", "-1000")],
        );
        cluster_map.add_record(&rec, "a", false);
        let records = get_consensus_records(cluster_map, &settings(0));
        assert_eq!(records[0].svlen.as_deref(), Some("-1000"));
    }

    #[test]
    fn test_svlen_not_synthesized_for_insertion() {
        let mut cluster_map = ClusterMap::new(0, 10);
        let rec = make_record("chr1", 1000, "N", "<INS>", &[("SVTYPE", "INS"), ("END", "1001")]);
        cluster_map.add_record(&rec, "a", false);
        let records = get_consensus_records(cluster_map, &settings(0));
        assert_eq!(records[0].svtype.as_deref(), Some("INS"));
        assert_eq!(records[0].svlen, None);
    }

    #[test]
    fn test_three_caller_deletion() {
        let mut cluster_map = ClusterMap::new(0, 10);
        cluster_map.add_record(&make_deletion("chr1", 1000, 2000), "manta", false);
        cluster_map.add_record(&make_deletion("chr1", 995, 2005), "delly", false);
        cluster_map.add_record(&make_deletion("chr1", 1005, 1996), "lumpy", false);

        let records = get_consensus_records(cluster_map, &settings(2));
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.callers, vec!["manta", "delly", "lumpy"]);
        assert_eq!(record.caller_count, Some(3));
        assert_eq!(record.filter, ConsensusFilter::Pass);
        assert_eq!(record.pos, 1000);
        assert_eq!(record.ref_allele, "N");
        assert_eq!(record.alt_allele, "N[chr1:2000[");
        assert_eq!(record.svtype.as_deref(), Some("DEL"));
        assert_eq!(record.svlen.as_deref(), Some("999"));
    }
}
