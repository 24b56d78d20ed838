pub mod categories;
pub mod media;
pub mod region;
pub mod text;

use crate::model::{
    Attributes, CanonicalPlace, DataCompleteness, PlaceStatus, PublicInfo, RawItem,
};
use categories::CategoryTable;
use region::RegionTable;

/// Maps raw source items to canonical places. Holds the lookup tables so
/// they can be swapped without touching the matching code.
#[derive(Debug, Clone)]
pub struct Normalizer {
    pub categories: CategoryTable,
    pub regions: RegionTable,
    pub kid_keywords: Vec<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Normalizer {
            categories: CategoryTable::default(),
            regions: RegionTable::default(),
            kid_keywords: text::DEFAULT_KID_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

impl Normalizer {
    /// Total over any input: missing fields become defaults or nulls.
    pub fn normalize(&self, item: &RawItem) -> CanonicalPlace {
        let alltag = item.alltag.as_deref();
        let introduction = item.introduction.as_deref();

        let matched = self.categories.map(alltag);
        let kid_friendly = text::mentions_any(&self.kid_keywords, alltag, introduction);
        let (expert_tip_raw, description) = text::split_tip(introduction);

        let address = first_non_empty(&[&item.roadaddress, &item.address]);
        let region = self.regions.locate(address.as_deref());

        CanonicalPlace {
            place_id: item.contentsid.clone().unwrap_or_default(),
            place_name: item.title.clone().unwrap_or_default(),
            status: PlaceStatus::Draft,
            categories: matched.categories,
            categories_kr: matched.categories_kr,
            data_completeness: DataCompleteness::Basic,
            address,
            region,
            location: media::geo_point(item.latitude.as_deref(), item.longitude.as_deref()),
            images: media::images(item),
            attributes: Attributes::with_kids(kid_friendly),
            public_info: PublicInfo {
                phone_number: item.phoneno.clone().filter(|p| !p.trim().is_empty()),
                ..Default::default()
            },
            expert_tip_raw,
            description,
            tags: text::split_tags(alltag),
        }
    }
}

fn first_non_empty(candidates: &[&Option<String>]) -> Option<String> {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .find(|s| !s.trim().is_empty())
        .map(str::to_string)
}
