use crate::model::{GeoPoint, ImageInfo, RawItem};

/// The source API sometimes serves image URLs on this misspelled host.
const BROKEN_IMAGE_HOST: &str = "visitjejeju.net";
const IMAGE_HOST: &str = "visitjeju.net";

/// The representative photo as a single captioned image, if it has a path.
pub fn images(item: &RawItem) -> Vec<ImageInfo> {
    item.photo()
        .and_then(|p| p.imgpath.as_deref())
        .filter(|path| !path.trim().is_empty())
        .map(|path| ImageInfo {
            url: path.replace(BROKEN_IMAGE_HOST, IMAGE_HOST),
            caption: item.title.clone().unwrap_or_default(),
        })
        .into_iter()
        .collect()
}

/// Both coordinates parsed, or nothing.
pub fn geo_point(latitude: Option<&str>, longitude: Option<&str>) -> Option<GeoPoint> {
    Some(GeoPoint {
        latitude: parse_coordinate(latitude)?,
        longitude: parse_coordinate(longitude)?,
    })
}

fn parse_coordinate(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
