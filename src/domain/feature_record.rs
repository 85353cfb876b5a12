use crate::error::PredictError;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Maps the field name used on the wire to the name kept in stored records.
/// Only the social media channel differs: its wire name carries a space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldName {
    pub wire: &'static str,
    pub stored: &'static str,
}

pub const FIELDS: [FieldName; 10] = [
    FieldName { wire: "Age", stored: "Age" },
    FieldName { wire: "AdSpend", stored: "AdSpend" },
    FieldName { wire: "ClickThroughRate", stored: "ClickThroughRate" },
    FieldName { wire: "WebsiteVisits", stored: "WebsiteVisits" },
    FieldName { wire: "TimeOnSite", stored: "TimeOnSite" },
    FieldName { wire: "Gender_Male", stored: "Gender_Male" },
    FieldName { wire: "CampaignChannel_PPC", stored: "CampaignChannel_PPC" },
    FieldName { wire: "CampaignChannel_Referral", stored: "CampaignChannel_Referral" },
    FieldName { wire: "CampaignChannel_SEO", stored: "CampaignChannel_SEO" },
    FieldName { wire: "CampaignChannel_Social Media", stored: "CampaignChannel_Social_Media" },
];

pub const CTR_LOG_FEATURE: &str = "CTR_log";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    #[serde(rename = "Age", deserialize_with = "integral")]
    pub age: i64,
    #[serde(rename = "AdSpend")]
    pub ad_spend: f64,
    #[serde(rename = "ClickThroughRate")]
    pub click_through_rate: f64,
    #[serde(rename = "WebsiteVisits", deserialize_with = "integral")]
    pub website_visits: i64,
    #[serde(rename = "TimeOnSite")]
    pub time_on_site: f64,
    #[serde(rename = "Gender_Male", deserialize_with = "integral")]
    pub gender_male: i64,
    #[serde(rename = "CampaignChannel_PPC", deserialize_with = "integral")]
    pub channel_ppc: i64,
    #[serde(rename = "CampaignChannel_Referral", deserialize_with = "integral")]
    pub channel_referral: i64,
    #[serde(rename = "CampaignChannel_SEO", deserialize_with = "integral")]
    pub channel_seo: i64,
    #[serde(
        rename = "CampaignChannel_Social_Media",
        alias = "CampaignChannel_Social Media",
        deserialize_with = "integral"
    )]
    pub channel_social_media: i64,
}

impl FeatureRecord {
    pub fn validate(&self) -> Result<(), PredictError> {
        int_in_range("Age", self.age, 18, 100)?;
        non_negative("AdSpend", self.ad_spend)?;
        unit_interval("ClickThroughRate", self.click_through_rate)?;
        if self.website_visits < 0 {
            return Err(invalid(
                "WebsiteVisits",
                format!("must be greater than or equal to 0, got {}", self.website_visits),
            ));
        }
        non_negative("TimeOnSite", self.time_on_site)?;
        flag("Gender_Male", self.gender_male)?;
        flag("CampaignChannel_PPC", self.channel_ppc)?;
        flag("CampaignChannel_Referral", self.channel_referral)?;
        flag("CampaignChannel_SEO", self.channel_seo)?;
        flag("CampaignChannel_Social Media", self.channel_social_media)?;
        Ok(())
    }

    /// Raw field values in `FIELDS` order.
    pub fn values(&self) -> [f64; 10] {
        [
            self.age as f64,
            self.ad_spend,
            self.click_through_rate,
            self.website_visits as f64,
            self.time_on_site,
            self.gender_male as f64,
            self.channel_ppc as f64,
            self.channel_referral as f64,
            self.channel_seo as f64,
            self.channel_social_media as f64,
        ]
    }

    /// Feature vector handed to the classifier: the raw fields followed by
    /// `ln(1 + ClickThroughRate)`. The derived value is never stored.
    pub fn model_features(&self) -> Vec<f64> {
        let mut features = self.values().to_vec();
        features.push(self.click_through_rate.ln_1p());
        features
    }

    /// Serializes with wire field names, as the service expects in `POST /predict`.
    pub fn to_wire(&self) -> anyhow::Result<serde_json::Value> {
        let stored = match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => map,
            other => anyhow::bail!("feature record serialized to a non-object: {other}"),
        };

        let mut wire = serde_json::Map::new();
        for field in FIELDS {
            if let Some(v) = stored.get(field.stored) {
                wire.insert(field.wire.to_string(), v.clone());
            }
        }
        Ok(serde_json::Value::Object(wire))
    }
}

pub fn model_feature_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = FIELDS.iter().map(|f| f.wire).collect();
    names.push(CTR_LOG_FEATURE);
    names
}

/// Integer fields also accept whole-valued floats such as `25.0`.
fn integral<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let n = serde_json::Number::deserialize(deserializer)?;
    if let Some(v) = n.as_i64() {
        return Ok(v);
    }
    match n.as_f64() {
        Some(v) if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 => Ok(v as i64),
        _ => Err(D::Error::custom(format!("expected an integer, got {n}"))),
    }
}

fn invalid(field: &str, reason: String) -> PredictError {
    PredictError::Validation {
        field: field.to_string(),
        reason,
    }
}

fn int_in_range(field: &str, v: i64, min: i64, max: i64) -> Result<(), PredictError> {
    if v < min || v > max {
        return Err(invalid(field, format!("must be between {min} and {max}, got {v}")));
    }
    Ok(())
}

fn non_negative(field: &str, v: f64) -> Result<(), PredictError> {
    if !v.is_finite() || v < 0.0 {
        return Err(invalid(field, format!("must be a finite number >= 0, got {v}")));
    }
    Ok(())
}

fn unit_interval(field: &str, v: f64) -> Result<(), PredictError> {
    if !v.is_finite() || !(0.0..=1.0).contains(&v) {
        return Err(invalid(field, format!("must be between 0 and 1, got {v}")));
    }
    Ok(())
}

fn flag(field: &str, v: i64) -> Result<(), PredictError> {
    if v != 0 && v != 1 {
        return Err(invalid(field, format!("must be 0 or 1, got {v}")));
    }
    Ok(())
}
