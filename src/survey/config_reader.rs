use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use snafu::prelude::*;

use std::fs;

use pairwise_engine::{ClusterMap, Cluster, GenerationRules, SamplingMode, Variant};

use crate::survey::clusters::default_cluster_map;
use crate::survey::*;

pub const DEFAULT_PRICES_WORKSHEET: &str = "small_sample_prices";
pub const DEFAULT_IMAGES_WORKSHEET: &str = "brand_images_real";

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "surveyName")]
    pub survey_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BrandSource {
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "pricesWorksheetName")]
    pub prices_worksheet_name: Option<String>,
    #[serde(rename = "imagesWorksheetName")]
    pub images_worksheet_name: Option<String>,
    #[serde(rename = "nameColumn")]
    pub name_column: Option<String>,
    #[serde(rename = "priceColumn")]
    pub price_column: Option<String>,
    #[serde(rename = "imageColumn")]
    pub image_column: Option<String>,
    #[serde(rename = "subCategoryColumn")]
    pub sub_category_column: Option<String>,
}

impl BrandSource {
    pub fn prices_worksheet(&self) -> &str {
        self.prices_worksheet_name
            .as_deref()
            .unwrap_or(DEFAULT_PRICES_WORKSHEET)
    }

    pub fn images_worksheet(&self) -> &str {
        self.images_worksheet_name
            .as_deref()
            .unwrap_or(DEFAULT_IMAGES_WORKSHEET)
    }

    pub fn name_col(&self) -> &str {
        self.name_column.as_deref().unwrap_or("Brand")
    }

    pub fn price_col(&self) -> &str {
        self.price_column.as_deref().unwrap_or("Average Price")
    }

    pub fn image_col(&self) -> &str {
        self.image_column.as_deref().unwrap_or("Product image URL")
    }

    pub fn sub_category_col(&self) -> &str {
        self.sub_category_column.as_deref().unwrap_or("Category 2")
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct InfluencerSource {
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "imageUrlPrefix")]
    pub image_url_prefix: Option<String>,
    #[serde(rename = "nameColumn")]
    pub name_column: Option<String>,
    #[serde(rename = "categoryColumn")]
    pub category_column: Option<String>,
    #[serde(rename = "followersColumn")]
    pub followers_column: Option<String>,
    #[serde(rename = "captionColumn")]
    pub caption_column: Option<String>,
    #[serde(rename = "imageColumn")]
    pub image_column: Option<String>,
}

impl InfluencerSource {
    pub fn url_prefix(&self) -> &str {
        self.image_url_prefix.as_deref().unwrap_or("")
    }

    pub fn name_col(&self) -> &str {
        self.name_column.as_deref().unwrap_or("influencer_name")
    }

    pub fn category_col(&self) -> &str {
        self.category_column.as_deref().unwrap_or("Category")
    }

    pub fn followers_col(&self) -> &str {
        self.followers_column.as_deref().unwrap_or("Followers")
    }

    pub fn caption_col(&self) -> &str {
        self.caption_column.as_deref().unwrap_or("caption")
    }

    pub fn image_col(&self) -> &str {
        self.image_column.as_deref().unwrap_or("Image_file_name")
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ClusterEntry {
    pub name: String,
    pub cluster: u32,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurveyRules {
    #[serde(rename = "randomSeed")]
    pub random_seed: Option<JSValue>,
    #[serde(rename = "contrastQuestions")]
    pub contrast_questions: Option<usize>,
    #[serde(rename = "distinctContrastPairs")]
    pub distinct_contrast_pairs: Option<usize>,
    #[serde(rename = "mixedQuestions")]
    pub mixed_questions: Option<usize>,
    #[serde(rename = "brandImagesPerItem")]
    pub brand_images_per_item: Option<usize>,
    #[serde(rename = "postsPerInfluencer")]
    pub posts_per_influencer: Option<usize>,
    #[serde(rename = "distinctAssets")]
    pub distinct_assets: Option<bool>,
}

impl SurveyRules {
    /// The seed may be written as a number or as a string.
    pub fn random_seed(&self) -> SurveyResult<Option<u64>> {
        match &self.random_seed {
            None | Some(JSValue::Null) => Ok(None),
            Some(JSValue::Number(n)) => match n.as_u64() {
                Some(x) => Ok(Some(x)),
                None => whatever!("randomSeed must be a non-negative integer: {}", n),
            },
            Some(JSValue::String(s)) if s.is_empty() => Ok(None),
            Some(JSValue::String(s)) => match s.parse::<u64>() {
                Ok(x) => Ok(Some(x)),
                Err(_) => whatever!("randomSeed must be a non-negative integer: {:?}", s),
            },
            Some(x) => whatever!("randomSeed must be a non-negative integer: {:?}", x),
        }
    }

    /// The defaults of the variant, overridden by the values set in the file.
    pub fn generation_rules(&self, variant: Variant) -> GenerationRules {
        let default = GenerationRules::for_variant(variant);
        let assets_per_item = match variant {
            Variant::Brands => self.brand_images_per_item,
            Variant::Influencers => self.posts_per_influencer,
        };
        GenerationRules {
            contrast_questions: self
                .contrast_questions
                .unwrap_or(default.contrast_questions),
            distinct_contrast_pairs: match variant {
                Variant::Brands => self
                    .distinct_contrast_pairs
                    .unwrap_or(default.distinct_contrast_pairs),
                Variant::Influencers => default.distinct_contrast_pairs,
            },
            mixed_questions: self.mixed_questions.unwrap_or(default.mixed_questions),
            assets_per_item: assets_per_item.unwrap_or(default.assets_per_item),
            sampling: match self.distinct_assets {
                Some(true) => SamplingMode::Distinct,
                Some(false) => SamplingMode::WithReplacement,
                None => default.sampling,
            },
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SurveyConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "brandSource")]
    pub brand_source: Option<BrandSource>,
    #[serde(rename = "influencerSource")]
    pub influencer_source: Option<InfluencerSource>,
    #[serde(rename = "brandClusters")]
    pub brand_clusters: Option<Vec<ClusterEntry>>,
    pub rules: Option<SurveyRules>,
}

impl SurveyConfig {
    pub fn rules(&self) -> SurveyRules {
        self.rules.clone().unwrap_or_default()
    }

    /// The clusters listed in the file, or the built-in brand clusters.
    pub fn cluster_map(&self) -> ClusterMap {
        match &self.brand_clusters {
            Some(entries) => ClusterMap::from_pairs(
                entries
                    .iter()
                    .map(|e| (e.name.as_str(), Cluster::Numbered(e.cluster))),
            ),
            None => default_cluster_map(),
        }
    }
}

pub fn parse_config(contents: &str) -> SurveyResult<SurveyConfig> {
    let config: SurveyConfig = serde_json::from_str(contents).context(ParsingJsonSnafu {})?;
    debug!("config: {:?}", config);
    Ok(config)
}

pub fn read_config(path: &str) -> SurveyResult<SurveyConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu {
        path: path.to_string(),
    })?;
    parse_config(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = parse_config(
            r#"{"outputSettings": {"surveyName": "s"},
                "brandSource": {"filePath": "brands.xlsx"}}"#,
        )
        .unwrap();
        let source = config.brand_source.clone().unwrap();
        assert_eq!(source.prices_worksheet(), "small_sample_prices");
        assert_eq!(source.images_worksheet(), "brand_images_real");
        assert_eq!(source.price_col(), "Average Price");
        assert_eq!(config.rules().random_seed().unwrap(), None);
        assert_eq!(
            config.rules().generation_rules(Variant::Brands),
            GenerationRules::BRAND_RULES
        );
        assert_eq!(
            config.rules().generation_rules(Variant::Influencers),
            GenerationRules::INFLUENCER_RULES
        );
        assert_eq!(
            config.cluster_map().get("gucci"),
            Some(&Cluster::Numbered(1))
        );
    }

    #[test]
    fn rules_override_defaults() {
        let config = parse_config(
            r#"{"outputSettings": {"surveyName": "s"},
                "brandClusters": [{"name": "Acme", "cluster": 9}],
                "rules": {"randomSeed": "42", "mixedQuestions": 3, "postsPerInfluencer": 2,
                          "distinctAssets": true}}"#,
        )
        .unwrap();
        let rules = config.rules();
        assert_eq!(rules.random_seed().unwrap(), Some(42));
        let r = rules.generation_rules(Variant::Influencers);
        assert_eq!(r.mixed_questions, 3);
        assert_eq!(r.assets_per_item, 2);
        assert_eq!(r.sampling, SamplingMode::Distinct);
        assert_eq!(r.contrast_questions, 20);
        assert_eq!(
            rules.generation_rules(Variant::Brands).assets_per_item,
            6
        );
        let map = config.cluster_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("ACME"), Some(&Cluster::Numbered(9)));
    }

    #[test]
    fn bad_seed() {
        let rules = SurveyRules {
            random_seed: Some(JSValue::String("abc".to_string())),
            ..SurveyRules::default()
        };
        assert!(rules.random_seed().is_err());
    }
}
