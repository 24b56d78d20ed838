use serde::Serialize;

/// Administrative subdivisions of Jeju used as the `region` vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Region {
    #[serde(rename = "애월읍")]
    Aewol,
    #[serde(rename = "한림읍")]
    Hallim,
    #[serde(rename = "한경면")]
    Hangyeong,
    #[serde(rename = "대정읍")]
    Daejeong,
    #[serde(rename = "조천읍")]
    Jocheon,
    #[serde(rename = "구좌읍")]
    Gujwa,
    #[serde(rename = "성산읍")]
    Seongsan,
    #[serde(rename = "우도면")]
    Udo,
    #[serde(rename = "안덕면")]
    Andeok,
    #[serde(rename = "남원읍")]
    Namwon,
    #[serde(rename = "표선면")]
    Pyoseon,
    #[serde(rename = "서귀포시 동(洞) 지역")]
    SeogwipoCity,
    #[serde(rename = "제주시 동(洞) 지역")]
    JejuCity,
}

// Specific town names come before the city names that also appear in
// most addresses.
const DEFAULT_TABLE: &[(&str, Region)] = &[
    ("애월읍", Region::Aewol),
    ("애월", Region::Aewol),
    ("한림읍", Region::Hallim),
    ("한림", Region::Hallim),
    ("한경면", Region::Hangyeong),
    ("한경", Region::Hangyeong),
    ("대정읍", Region::Daejeong),
    ("대정", Region::Daejeong),
    ("조천읍", Region::Jocheon),
    ("조천", Region::Jocheon),
    ("구좌읍", Region::Gujwa),
    ("구좌", Region::Gujwa),
    ("성산읍", Region::Seongsan),
    ("성산", Region::Seongsan),
    ("우도면", Region::Udo),
    ("우도", Region::Udo),
    ("안덕면", Region::Andeok),
    ("안덕", Region::Andeok),
    ("남원읍", Region::Namwon),
    ("남원", Region::Namwon),
    ("표선면", Region::Pyoseon),
    ("표선", Region::Pyoseon),
    ("서귀포시", Region::SeogwipoCity),
    ("중문", Region::SeogwipoCity),
    ("제주시", Region::JejuCity),
];

/// Ordered mapping from address fragments to regions. The first entry whose
/// key occurs in the address wins.
#[derive(Debug, Clone)]
pub struct RegionTable {
    entries: Vec<(String, Region)>,
}

impl Default for RegionTable {
    fn default() -> Self {
        RegionTable::new(DEFAULT_TABLE.iter().map(|(k, r)| (k.to_string(), *r)))
    }
}

impl RegionTable {
    pub fn new(entries: impl IntoIterator<Item = (String, Region)>) -> Self {
        RegionTable {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn locate(&self, address: Option<&str>) -> Option<Region> {
        let address = address.filter(|a| !a.is_empty())?;
        self.entries
            .iter()
            .find(|(key, _)| address.contains(key.as_str()))
            .map(|(_, region)| *region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn town_beats_city_in_default_table() {
        let table = RegionTable::default();
        assert_eq!(
            table.locate(Some("제주특별자치도 제주시 애월읍 애월해안로 272")),
            Some(Region::Aewol)
        );
        assert_eq!(
            table.locate(Some("제주특별자치도 서귀포시 성산읍 일출로 284-12")),
            Some(Region::Seongsan)
        );
        assert_eq!(
            table.locate(Some("제주특별자치도 제주시 관덕로 19")),
            Some(Region::JejuCity)
        );
        assert_eq!(
            table.locate(Some("서귀포시 중문관광로 72")),
            Some(Region::SeogwipoCity)
        );
    }

    #[test]
    fn table_order_wins_over_specificity() {
        let table = RegionTable::new(vec![
            ("제주시".to_string(), Region::JejuCity),
            ("애월".to_string(), Region::Aewol),
        ]);
        assert_eq!(table.locate(Some("제주시 애월읍 123")), Some(Region::JejuCity));
    }

    #[test]
    fn unmatched_or_missing_address() {
        let table = RegionTable::default();
        assert_eq!(table.locate(None), None);
        assert_eq!(table.locate(Some("")), None);
        assert_eq!(table.locate(Some("서울특별시 종로구")), None);
    }

    #[test]
    fn serializes_to_korean_label() {
        let v = serde_json::to_value(Region::SeogwipoCity).unwrap();
        assert_eq!(v, "서귀포시 동(洞) 지역");
    }
}
