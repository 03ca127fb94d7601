//! Breakpoint clustering engine
//!
//! Records are ingested one at a time and either extend the nearest matching cluster or start a
//! new one. After ingestion the map is consumed to produce clusters in sorted order.
//!

pub mod variant_cluster;
mod window_index;

use log::debug;

use self::variant_cluster::{AllelePair, FinalizedCluster, VariantCluster};
use self::window_index::WindowIndex;
use crate::contig_order::compare_contigs;
use crate::location::{Location, Strand};
use crate::sv_locations::get_sv_locations;
use crate::variant_record::VariantRecord;

/// Index key for SNV/indel clusters
///
/// Point records only match clusters with exactly the same allele pair.
///
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
struct PointIndexKey {
    chrom: String,
    allele: Option<AllelePair>,
}

/// Index key for SV clusters
///
/// Everything about the breakpoint pair other than the two positions must match.
///
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
struct SvIndexKey {
    chrom1: String,
    is_right_end1: bool,

    /// Mate chromosome, strand and right-end state
    mate: Option<(String, Strand, bool)>,
}

impl SvIndexKey {
    fn new(loc1: &Location, loc2: Option<&Location>) -> Self {
        Self {
            chrom1: loc1.chrom().to_string(),
            is_right_end1: loc1.is_right_end(),
            mate: loc2.map(|x| (x.chrom().to_string(), x.strand(), x.is_right_end())),
        }
    }
}

/// How an ingested record was classified
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RecordClass {
    Point,
    Sv,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ClusterCounts {
    pub point_clusters: usize,
    pub sv_clusters: usize,
}

pub struct ClusterMap {
    point_window: i64,
    sv_window: i64,
    clusters: Vec<VariantCluster>,
    point_index: WindowIndex<PointIndexKey>,
    sv_index: WindowIndex<SvIndexKey>,
}

impl ClusterMap {
    /// Create an empty map
    ///
    /// # Arguments
    /// * `point_window` - Max position difference for SNV/indel records to join a cluster
    /// * `sv_window` - Max position difference on each breakpoint side for SV records to join a
    ///   cluster
    ///
    pub fn new(point_window: u32, sv_window: u32) -> Self {
        Self {
            point_window: point_window as i64,
            sv_window: sv_window as i64,
            clusters: Vec::new(),
            point_index: WindowIndex::new(),
            sv_index: WindowIndex::new(),
        }
    }

    /// Add a record to the nearest matching cluster, or start a new cluster
    ///
    /// The record is treated as an SV if `force_sv` is set or the record itself looks like an
    /// SV.
    ///
    pub fn add_record(&mut self, record: &VariantRecord, caller: &str, force_sv: bool) -> RecordClass {
        if force_sv || record.is_sv() {
            self.add_sv_record(record, caller);
            RecordClass::Sv
        } else {
            self.add_point_record(record, caller);
            RecordClass::Point
        }
    }

    /// Add a SNV/indel record, once for each of its alt alleles
    fn add_point_record(&mut self, record: &VariantRecord, caller: &str) {
        let alleles = if record.alt_alleles.is_empty() {
            vec![None]
        } else {
            record
                .alt_alleles
                .iter()
                .map(|alt| {
                    Some(AllelePair {
                        ref_allele: record.ref_allele.clone(),
                        alt_allele: alt.clone(),
                    })
                })
                .collect()
        };

        for allele in alleles {
            let key = PointIndexKey {
                chrom: record.chrom.clone(),
                allele,
            };
            let nearest = self
                .point_index
                .get_window(&key, record.pos, self.point_window)
                .map(|(anchor_pos, cluster_index)| {
                    ((anchor_pos - record.pos).abs(), cluster_index)
                })
                .min();

            let cluster_index = match nearest {
                Some((_, cluster_index)) => cluster_index,
                None => {
                    let location = Location::new(&record.chrom, record.pos, Strand::Forward, false);
                    let cluster_index = self.clusters.len();
                    self.clusters
                        .push(VariantCluster::new_point(location, key.allele.clone()));
                    self.point_index.insert(key, record.pos, cluster_index);
                    cluster_index
                }
            };
            self.clusters[cluster_index].add_point_member(caller, record.clone());
        }
    }

    fn add_sv_record(&mut self, record: &VariantRecord, caller: &str) {
        let locs = get_sv_locations(record);
        let pos1 = locs.loc1.pos();
        let pos2 = locs.loc2.as_ref().map(|x| x.pos());
        let key = SvIndexKey::new(&locs.loc1, locs.loc2.as_ref());

        let clusters = &self.clusters;
        let sv_window = self.sv_window;
        let nearest = self
            .sv_index
            .get_window(&key, pos1, sv_window)
            .filter_map(|(anchor_pos1, cluster_index)| {
                let dist1 = (anchor_pos1 - pos1).abs();
                let dist2 = match (pos2, clusters[cluster_index].anchor_pos2()) {
                    (Some(pos2), Some(anchor_pos2)) => {
                        let dist2 = (anchor_pos2 - pos2).abs();
                        if dist2 > sv_window {
                            return None;
                        }
                        dist2
                    }
                    (None, None) => 0,
                    _ => return None,
                };
                Some((dist1 + dist2, cluster_index))
            })
            .min();

        let cluster_index = match nearest {
            Some((_, cluster_index)) => cluster_index,
            None => {
                let cluster_index = self.clusters.len();
                self.clusters
                    .push(VariantCluster::new_sv(locs.loc1.clone(), locs.loc2.clone()));
                self.sv_index.insert(key, pos1, cluster_index);
                cluster_index
            }
        };
        self.clusters[cluster_index].add_sv_member(
            caller,
            record.clone(),
            &locs.loc1,
            locs.loc2.as_ref(),
        );
    }

    pub fn cluster_counts(&self) -> ClusterCounts {
        // Each cluster is indexed once, under its creating record's key
        ClusterCounts {
            point_clusters: self.point_index.len(),
            sv_clusters: self.sv_index.len(),
        }
    }

    /// Consume the map and iterate over all finalized clusters in sorted order
    ///
    /// Clusters are sorted by chromosome in karyotype order, then by median position of the
    /// first breakpoint, then by cluster creation order.
    ///
    pub fn into_sorted_clusters(self) -> impl Iterator<Item = FinalizedCluster> {
        let ClusterMap { clusters, .. } = self;
        debug!("Sorting {} clusters for output", clusters.len());

        let mut clusters = clusters
            .into_iter()
            .enumerate()
            .map(|(cluster_index, cluster)| (cluster.median_pos1(), cluster_index, cluster))
            .collect::<Vec<_>>();
        clusters.sort_by(|(pos_a, index_a, cluster_a), (pos_b, index_b, cluster_b)| {
            compare_contigs(cluster_a.chrom(), cluster_b.chrom())
                .then(pos_a.cmp(pos_b))
                .then(index_a.cmp(index_b))
        });
        clusters.into_iter().map(|(_, _, cluster)| cluster.finalize())
    }
}
