use crate::domain::feature_record::FeatureRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Channel {
    Ppc,
    Referral,
    Seo,
    SocialMedia,
}

/// Operator-facing values before they are turned into model fields.
#[derive(Debug, Clone)]
pub struct PredictionForm {
    pub age: i64,
    pub ad_spend: f64,
    pub click_through_rate: f64,
    pub website_visits: i64,
    pub time_on_site: f64,
    pub gender: Gender,
    pub channel: Channel,
}

impl PredictionForm {
    pub fn to_feature_record(&self) -> FeatureRecord {
        let one_hot = |c: Channel| i64::from(self.channel == c);
        FeatureRecord {
            age: self.age,
            ad_spend: self.ad_spend,
            click_through_rate: self.click_through_rate,
            website_visits: self.website_visits,
            time_on_site: self.time_on_site,
            gender_male: i64::from(self.gender == Gender::Male),
            channel_ppc: one_hot(Channel::Ppc),
            channel_referral: one_hot(Channel::Referral),
            channel_seo: one_hot(Channel::Seo),
            channel_social_media: one_hot(Channel::SocialMedia),
        }
    }
}

pub fn parse_non_negative(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if !v.is_finite() || v < 0.0 {
        return Err(format!("`{s}` must be >= 0"));
    }
    Ok(v)
}

pub fn parse_rate(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if !(0.0..=1.0).contains(&v) {
        return Err(format!("`{s}` must be between 0 and 1"));
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(gender: Gender, channel: Channel) -> PredictionForm {
        PredictionForm {
            age: 25,
            ad_spend: 100.0,
            click_through_rate: 0.05,
            website_visits: 10,
            time_on_site: 30.0,
            gender,
            channel,
        }
    }

    #[test]
    fn gender_maps_to_flag() {
        assert_eq!(form(Gender::Male, Channel::Ppc).to_feature_record().gender_male, 1);
        assert_eq!(form(Gender::Female, Channel::Ppc).to_feature_record().gender_male, 0);
    }

    #[test]
    fn channel_sets_exactly_one_flag() {
        let rec = form(Gender::Female, Channel::SocialMedia).to_feature_record();
        assert_eq!(
            [rec.channel_ppc, rec.channel_referral, rec.channel_seo, rec.channel_social_media],
            [0, 0, 0, 1]
        );
        assert_eq!(rec.to_wire().unwrap()["CampaignChannel_Social Media"], 1);

        let rec = form(Gender::Female, Channel::Referral).to_feature_record();
        assert_eq!(
            [rec.channel_ppc, rec.channel_referral, rec.channel_seo, rec.channel_social_media],
            [0, 1, 0, 0]
        );
    }

    #[test]
    fn advisory_parsers() {
        assert_eq!(parse_rate("0.25"), Ok(0.25));
        assert!(parse_rate("1.5").is_err());
        assert!(parse_non_negative("-2").is_err());
        assert!(parse_non_negative("abc").is_err());
        assert_eq!(parse_non_negative("30"), Ok(30.0));
    }
}
