//! Shape plans: the compiled, ordered lookup lists for a script, language
//! and feature selection.

use super::buffer::{Digest, JoinAction};
use super::feature::{self, is_joining_feature};
use super::Direction;
use crate::internal::{at::*, Bytes, RawTag};
use crate::text::Script;
use lru::LruCache;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

/// Bit index reserved for features that always apply.
const ALWAYS_BIT: u8 = 31;
/// Number of assignable feature mask bits.
const FEATURE_BITS: u8 = 31;

/// A lookup in a shape plan, in ascending lookup index order.
#[derive(Clone, Debug)]
pub struct PlanLookup {
    pub data: LookupData,
    /// Mask gating application: the union of the owning features' bits.
    pub mask: u32,
    /// Argument of the first owning feature (alternate index selection).
    pub arg: u16,
    /// Range of this lookup's subtables in the plan's subtable list.
    pub subtables: (u16, u16),
    /// Union of the coverage digests of all subtables.
    pub digest: Digest,
}

/// Compiled, ordered lookup lists for a (face, script, language,
/// direction, features, coordinates) tuple.
pub struct ShapePlan {
    pub script: Script,
    /// Selected script and language tags per stage: [gsub script, gsub
    /// lang, gpos script, gpos lang].
    pub tags: [RawTag; 4],
    /// Feature tag to (mask bit, argument) record; sorted by tag.
    pub features: Vec<(RawTag, u8, u16)>,
    pub sub_lookups: Vec<PlanLookup>,
    pub pos_lookups: Vec<PlanLookup>,
    pub subtables: Vec<SubtableData>,
    /// Mask carried by every glyph before joining analysis.
    pub global_mask: u32,
    /// Per joining action glyph masks.
    pub joining_masks: [u32; 8],
    pub has_feature_vars: bool,
}

impl ShapePlan {
    /// Returns the mask bit assigned to a feature, if the plan selected
    /// it.
    pub fn feature_bit(&self, tag: RawTag) -> Option<u8> {
        self.features
            .binary_search_by(|entry| entry.0.cmp(&tag))
            .ok()
            .map(|index| self.features[index].1)
    }

    /// Returns the subtables for the specified lookup.
    pub fn lookup_subtables(&self, lookup: &PlanLookup) -> &[SubtableData] {
        &self.subtables[lookup.subtables.0 as usize..lookup.subtables.1 as usize]
    }
}

struct FeatureInfo {
    tag: RawTag,
    arg: u16,
    bit: u8,
    digest: Digest,
}

struct LookupEntry {
    stage: u8,
    index: u16,
    owners: SmallVec<[u16; 4]>,
}

/// Builder holding the scratch state for plan compilation.
#[derive(Default)]
pub struct PlanBuilder {
    features: Vec<FeatureInfo>,
    lookups: Vec<LookupEntry>,
}

impl PlanBuilder {
    /// Compiles a plan. Planning is deterministic and pure: the same
    /// inputs always produce the same plan.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        &mut self,
        data: &[u8],
        gdef: &Gdef,
        gsub: &StageOffsets,
        gpos: &StageOffsets,
        script: Script,
        tags: [RawTag; 4],
        coords: &[i16],
        user_features: &[(RawTag, u16)],
    ) -> ShapePlan {
        let b = Bytes::new(data);
        self.features.clear();
        self.lookups.clear();
        let mut plan = ShapePlan {
            script,
            tags,
            features: Vec::new(),
            sub_lookups: Vec::new(),
            pos_lookups: Vec::new(),
            subtables: Vec::new(),
            global_mask: 1 << ALWAYS_BIT,
            joining_masks: [0; 8],
            has_feature_vars: gsub.var != 0 || gpos.var != 0,
        };
        for (stage, offsets) in [(0u8, gsub), (1u8, gpos)] {
            if offsets.base != 0 && offsets.lang != 0 {
                self.collect_stage(&b, offsets, stage, script, coords, user_features);
            }
        }
        // Parse lookups in ascending index order per stage and accumulate
        // coverage digests per lookup and per feature.
        self.lookups.sort_by_key(|entry| (entry.stage, entry.index));
        let gdef = gdef.ok().then_some(gdef);
        let mut parsed: Vec<(u8, SmallVec<[u16; 4]>, PlanLookup)> =
            Vec::with_capacity(self.lookups.len());
        for entry in &self.lookups {
            let offsets = if entry.stage == 0 { gsub } else { gpos };
            let list_base = match lookup_list_offset(&b, offsets.base) {
                Some(base) => base,
                None => continue,
            };
            let data = match lookup_data(&b, entry.stage, list_base, entry.index, gdef) {
                Some(data) => data,
                None => continue,
            };
            let start = plan.subtables.len();
            let mut digest = Digest::default();
            if !collect_subtables(&b, &data, &mut plan.subtables, &mut digest) {
                plan.subtables.truncate(start);
                continue;
            }
            for &owner in &entry.owners {
                if let Some(info) = self.features.get_mut(owner as usize) {
                    info.digest.merge(&digest);
                }
            }
            parsed.push((
                entry.stage,
                entry.owners.clone(),
                PlanLookup {
                    data,
                    mask: 0,
                    arg: entry
                        .owners
                        .first()
                        .and_then(|&o| self.features.get(o as usize))
                        .map(|f| f.arg)
                        .unwrap_or(0),
                    subtables: (start as u16, plan.subtables.len() as u16),
                    digest,
                },
            ));
        }
        // Assign mask bits. The first 31 features get their own bit;
        // overflow features share a bit with digest-disjoint features, or
        // fall back to the always-on bit.
        let mut bit_digests: Vec<Digest> = Vec::new();
        for info in &mut self.features {
            if (bit_digests.len() as u8) < FEATURE_BITS {
                info.bit = bit_digests.len() as u8;
                bit_digests.push(info.digest);
            } else {
                let shared = bit_digests
                    .iter()
                    .position(|d| !d.may_intersect(&info.digest));
                match shared {
                    Some(bit) => {
                        info.bit = bit as u8;
                        bit_digests[bit].merge(&info.digest);
                    }
                    None => {
                        debug!(
                            feature = %tag_name(info.tag),
                            "feature mask bits exhausted; feature is always on"
                        );
                        info.bit = ALWAYS_BIT;
                    }
                }
            }
        }
        // Resolve lookup masks from the owner features.
        for (stage, owners, mut lookup) in parsed {
            for &owner in &owners {
                if let Some(info) = self.features.get(owner as usize) {
                    lookup.mask |= 1 << info.bit;
                }
            }
            if stage == 0 {
                plan.sub_lookups.push(lookup);
            } else {
                plan.pos_lookups.push(lookup);
            }
        }
        // Record the feature map and compute the glyph masks.
        for info in &self.features {
            plan.features.push((info.tag, info.bit, info.arg));
            if !is_joining_feature(info.tag) {
                plan.global_mask |= 1 << info.bit;
            }
        }
        plan.features.sort_unstable_by_key(|entry| entry.0);
        let actions = [
            (JoinAction::None, 0),
            (JoinAction::Isol, feature::ISOL),
            (JoinAction::Init, feature::INIT),
            (JoinAction::Medi, feature::MEDI),
            (JoinAction::Med2, feature::MED2),
            (JoinAction::Fina, feature::FINA),
            (JoinAction::Fin2, feature::FIN2),
            (JoinAction::Fin3, feature::FIN3),
        ];
        for (action, tag) in actions {
            let bit = plan.feature_bit(tag).map(|bit| 1u32 << bit).unwrap_or(0);
            plan.joining_masks[action as usize] = plan.global_mask | bit;
        }
        plan
    }

    fn collect_stage(
        &mut self,
        b: &Bytes,
        offsets: &StageOffsets,
        stage: u8,
        script: Script,
        coords: &[i16],
        user_features: &[(RawTag, u16)],
    ) -> Option<()> {
        let defaults = feature::default_features(script);
        let vars = FeatureSubsts::new(b, offsets.var, coords);
        let required = required_feature(b, offsets.lang);
        let count = language_feature_count(b, offsets.lang);
        let mut indices: SmallVec<[u16; 32]> = SmallVec::new();
        for i in 0..count {
            if let Some(index) = language_feature_at(b, offsets.lang, i) {
                indices.push(index);
            }
        }
        if let Some(index) = required {
            if !indices.contains(&index) {
                indices.push(index);
            }
        }
        for findex in indices {
            let (tag, mut offset) = match feature_at(b, offsets.base, findex) {
                Some(feature) => feature,
                None => continue,
            };
            let user = user_features.iter().find(|f| f.0 == tag);
            let is_required = required == Some(findex);
            let enabled = match user {
                Some(&(_, value)) => value != 0 || is_required,
                None => is_required || defaults.contains(&tag),
            };
            if !enabled {
                continue;
            }
            // A matching feature variations record replaces the feature
            // table wholesale, the required feature included.
            if let Some(vars) = vars {
                if let Some(subst) = vars.apply(b, findex) {
                    offset = subst;
                }
            }
            let arg = user.map(|&(_, value)| value).unwrap_or(1);
            let slot = self.feature_slot(tag, arg);
            let lcount = feature_lookup_count(b, offset);
            for i in 0..lcount {
                if let Some(index) = feature_lookup_at(b, offset, i) {
                    self.add_lookup(stage, index, slot);
                }
            }
        }
        Some(())
    }

    fn feature_slot(&mut self, tag: RawTag, arg: u16) -> u16 {
        if let Some(index) = self.features.iter().position(|f| f.tag == tag) {
            return index as u16;
        }
        self.features.push(FeatureInfo {
            tag,
            arg,
            bit: ALWAYS_BIT,
            digest: Digest::default(),
        });
        (self.features.len() - 1) as u16
    }

    fn add_lookup(&mut self, stage: u8, index: u16, owner: u16) {
        if let Some(entry) = self
            .lookups
            .iter_mut()
            .find(|entry| entry.stage == stage && entry.index == index)
        {
            if !entry.owners.contains(&owner) {
                entry.owners.push(owner);
            }
        } else {
            let mut owners = SmallVec::new();
            owners.push(owner);
            self.lookups.push(LookupEntry {
                stage,
                index,
                owners,
            });
        }
    }
}

fn tag_name(tag: RawTag) -> String {
    let bytes = tag.to_be_bytes();
    core::str::from_utf8(&bytes).unwrap_or("????").to_string()
}

/// Collects the subtables of a lookup, validating coverage and building
/// the coverage digest. Returns false if no subtable survives validation.
fn collect_subtables(
    b: &Bytes,
    lookup: &LookupData,
    subtables: &mut Vec<SubtableData>,
    digest: &mut Digest,
) -> bool {
    let base = lookup.offset as usize;
    let list = base + 6;
    let start = subtables.len();
    for i in 0..lookup.count as usize {
        let offset = match b.read::<u16>(list + i * 2) {
            Some(offset) => base + offset as usize,
            None => continue,
        };
        let offset = if lookup.is_ext {
            match b.read::<u32>(offset + 4) {
                Some(ext) => offset + ext as usize,
                None => continue,
            }
        } else {
            offset
        };
        let fmt = match b.read::<u16>(offset) {
            Some(fmt) => fmt,
            None => continue,
        };
        if let Some(data) = subtable_data(b, offset as u32, lookup.kind, fmt) {
            let coverage_offset = data.offset + data.coverage as u32;
            if enumerate_coverage(b, coverage_offset, |g| digest.insert(g)).is_some() {
                subtables.push(data);
            }
        }
    }
    subtables.len() > start
}

/// Key identifying a cached plan.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PlanKey {
    pub script: Script,
    pub language: Option<RawTag>,
    pub direction: Direction,
    pub coords: Box<[i16]>,
    pub features: Box<[(RawTag, u16)]>,
}

/// Per face LRU cache of compiled plans.
pub struct PlanCache {
    entries: LruCache<PlanKey, Arc<ShapePlan>, FxBuildHasher>,
}

impl PlanCache {
    const CAPACITY: usize = 64;

    pub fn new() -> Self {
        Self {
            entries: LruCache::with_hasher(
                NonZeroUsize::new(Self::CAPACITY).unwrap(),
                FxBuildHasher,
            ),
        }
    }

    /// Returns the cached plan for the specified key, or builds one with
    /// the supplied closure.
    pub fn get(&mut self, key: PlanKey, build: impl FnOnce() -> ShapePlan) -> Arc<ShapePlan> {
        if let Some(plan) = self.entries.get(&key) {
            return plan.clone();
        }
        debug!(script = ?key.script, "shape plan cache miss");
        let plan = Arc::new(build());
        self.entries.put(key, plan.clone());
        plan
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PlanCache {
    fn default() -> Self {
        Self::new()
    }
}
