use serde::Serialize;

/// Controlled category vocabulary for places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Attraction,
    Restaurant,
    Cafe,
    Accommodation,
    Shopping,
    Festival,
    Activity,
    Beach,
    Oroom,
    Mountain,
    Waterfall,
    Forest,
    Park,
    Garden,
    Museum,
    Gallery,
    Exhibition,
    Performance,
    Culture,
    History,
    Traditional,
    Market,
    PhotoSpot,
    Sunset,
    NightView,
    Drive,
}

const DEFAULT_CATEGORY: Category = Category::Attraction;
const DEFAULT_CATEGORY_KR: &str = "관광지";

const DEFAULT_TABLE: &[(&str, Category)] = &[
    ("관광지", Category::Attraction),
    ("음식점", Category::Restaurant),
    ("카페", Category::Cafe),
    ("맛집", Category::Restaurant),
    ("숙박", Category::Accommodation),
    ("쇼핑", Category::Shopping),
    ("축제", Category::Festival),
    ("행사", Category::Festival),
    ("레저", Category::Activity),
    ("체험", Category::Activity),
    // nature
    ("해변", Category::Beach),
    ("바다", Category::Beach),
    ("오름", Category::Oroom),
    ("산", Category::Mountain),
    ("폭포", Category::Waterfall),
    ("숲", Category::Forest),
    ("공원", Category::Park),
    ("정원", Category::Garden),
    // culture
    ("박물관", Category::Museum),
    ("미술관", Category::Museum),
    ("갤러리", Category::Gallery),
    ("전시", Category::Exhibition),
    ("공연", Category::Performance),
    ("문화", Category::Culture),
    ("역사", Category::History),
    ("전통", Category::Traditional),
    // activities
    ("다이빙", Category::Activity),
    ("서핑", Category::Activity),
    ("스포츠", Category::Activity),
    ("낚시", Category::Activity),
    ("승마", Category::Activity),
    ("골프", Category::Activity),
    // markets
    ("전통시장", Category::Market),
    ("시장", Category::Market),
    ("면세점", Category::Shopping),
    ("아울렛", Category::Shopping),
    // lodging
    ("호텔", Category::Accommodation),
    ("펜션", Category::Accommodation),
    ("게스트하우스", Category::Accommodation),
    ("리조트", Category::Accommodation),
    ("모텔", Category::Accommodation),
    // misc
    ("포토존", Category::PhotoSpot),
    ("일몰", Category::Sunset),
    ("야경", Category::NightView),
    ("드라이브", Category::Drive),
];

/// Ordered mapping from source-language tag fragments to categories.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    entries: Vec<(String, Category)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMatch {
    pub categories: Vec<Category>,
    pub categories_kr: Vec<String>,
}

impl Default for CategoryTable {
    fn default() -> Self {
        CategoryTable::new(DEFAULT_TABLE.iter().map(|(k, c)| (k.to_string(), *c)))
    }
}

impl CategoryTable {
    pub fn new(entries: impl IntoIterator<Item = (String, Category)>) -> Self {
        CategoryTable {
            entries: entries.into_iter().collect(),
        }
    }

    /// Map a comma-separated tag string. Every table key contained in a tag
    /// contributes its category once, in first-seen order; `categories_kr`
    /// runs parallel to `categories`, holding the key that first produced each
    /// category. No match yields the default pair.
    pub fn map(&self, alltag: Option<&str>) -> CategoryMatch {
        let mut categories = Vec::new();
        let mut categories_kr = Vec::new();

        for tag in alltag.unwrap_or_default().split(',') {
            let tag = tag.trim();
            if tag.is_empty() {
                continue;
            }
            for (key, category) in &self.entries {
                if !tag.contains(key.as_str()) {
                    continue;
                }
                if categories.contains(category) {
                    continue;
                }
                categories.push(*category);
                categories_kr.push(key.clone());
            }
        }

        if categories.is_empty() {
            categories.push(DEFAULT_CATEGORY);
            categories_kr.push(DEFAULT_CATEGORY_KR.to_string());
        }
        CategoryMatch {
            categories,
            categories_kr,
        }
    }
}
