//! Listing categories harvested by a batch run.

use serde::{Deserialize, Serialize};

/// One category listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Stable key used for file names and the merged catalog.
    pub key: String,
    /// Display name.
    #[serde(default)]
    pub label: String,
    pub url: String,
}

impl Category {
    pub fn new(key: &str, label: &str, url: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            url: url.to_string(),
        }
    }
}

/// Men's listings, best sellers of the past year first.
const LISTING_QUERY: &str = "gf=M&sortCode=SALE_ONE_YEAR_COUNT";

/// (key, label, category code)
const DEFAULT_CATEGORIES: &[(&str, &str, &str)] = &[
    // Tops
    ("knit_sweater", "니트/스웨터", "001006"),
    ("sweatshirt", "맨투맨", "001005"),
    ("long_sleeve_tshirt", "긴소매 티셔츠", "001010"),
    ("hoodie", "후드", "001004"),
    ("shirt", "셔츠", "001002"),
    ("polo_tshirt", "피케/카라 티셔츠", "001003"),
    ("short_sleeve_tshirt", "반소매 티셔츠", "001001"),
    ("other_tops", "기타 상의", "001008"),
    ("sleeveless_tshirt", "민소매 티셔츠", "001011"),
    // Outerwear
    ("short_padding", "숏패딩/헤비 아우터", "002012"),
    ("blouson", "블루종", "002001"),
    ("safari_jacket", "사파리/헌팅 재킷", "002014"),
    ("fleece", "플리스/뽀글이", "002023"),
    ("trucker_jacket", "트러커 재킷", "002017"),
    ("coach_jacket", "나일론/코치 재킷", "002006"),
    ("winter_other_coat", "겨울 기타 코트", "002009"),
    ("training_jacket", "트레이닝 재킷", "002018"),
    ("blazer", "수트/블레이저 재킷", "002003"),
    ("other_outer", "기타 아우터", "002015"),
    ("winter_double_coat", "겨울 더블 코트", "002024"),
    ("winter_single_coat", "겨울 싱글 코트", "002007"),
    ("leather_jacket", "레더/라이더스 자켓", "002002"),
    ("shearling", "무스탕/퍼", "002025"),
    ("spring_coat", "환절기 코트", "002008"),
    ("anorak", "아노락 재킷", "002019"),
    ("padding_vest", "패딩 베스트", "002016"),
    ("zip_up_hoodie", "후드 집업", "002022"),
    ("vest", "베스트", "002021"),
    ("long_padding", "롱패딩/헤비 아우터", "002013"),
    ("stadium_jacket", "스타디움 재킷", "002004"),
    ("cardigan", "카디건", "002020"),
];

pub fn default_categories() -> Vec<Category> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(key, label, code)| {
            let url = format!(
                "https://www.musinsa.com/category/{}?{}",
                code, LISTING_QUERY
            );
            Category::new(key, label, &url)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_category_urls() {
        let categories = default_categories();
        let hoodie = categories.iter().find(|c| c.key == "hoodie").unwrap();
        assert_eq!(
            hoodie.url,
            "https://www.musinsa.com/category/001004?gf=M&sortCode=SALE_ONE_YEAR_COUNT"
        );
        assert_eq!(categories.first().unwrap().key, "knit_sweater");
        assert_eq!(categories.last().unwrap().key, "cardigan");
    }

    #[test]
    fn test_default_category_keys_unique() {
        let categories = default_categories();
        let mut keys: Vec<&str> = categories.iter().map(|c| c.key.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), categories.len());
    }
}
