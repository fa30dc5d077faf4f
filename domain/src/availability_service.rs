//! Weekly availability rules of a mentor.
//!
//! Rules are edited in memory and persisted only on an explicit save, which
//! replaces the mentor's whole rule set.

use chrono::{Datelike, NaiveDate};
use log::{info, warn};
use shared::{AvailabilityRule, NewAvailabilityRule};
use std::rc::Rc;
use uuid::Uuid;

use crate::error::ServiceResult;
use crate::gateway::{fetch_all, tables, to_row, DataGateway, Filter, Query};

/// Single-field edit of a weekday's rule
#[derive(Debug, Clone, PartialEq)]
pub enum RuleEdit {
    StartTime(String),
    EndTime(String),
    Available(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityPreset {
    /// Monday to Friday available
    WeekdaysOnly,
    /// Saturday and Sunday available
    WeekendsOnly,
}

fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// True only if the weekday of `date` has a rule and it is available
pub fn is_available_on(rules: &[AvailabilityRule], date: NaiveDate) -> bool {
    let day = weekday_index(date);
    rules
        .iter()
        .find(|rule| rule.day_of_week == day)
        .map(|rule| rule.is_available)
        .unwrap_or(false)
}

/// Flip the available flag of the weekday of `date`; no-op without a rule
pub fn toggle_day(rules: &mut [AvailabilityRule], date: NaiveDate) {
    let day = weekday_index(date);
    if let Some(rule) = rules.iter_mut().find(|rule| rule.day_of_week == day) {
        rule.is_available = !rule.is_available;
    }
}

pub fn edit_rule(rules: &mut [AvailabilityRule], day_of_week: u8, edit: RuleEdit) {
    for rule in rules.iter_mut().filter(|rule| rule.day_of_week == day_of_week) {
        match &edit {
            RuleEdit::StartTime(time) => rule.start_time = time.clone(),
            RuleEdit::EndTime(time) => rule.end_time = time.clone(),
            RuleEdit::Available(available) => rule.is_available = *available,
        }
    }
}

pub fn apply_preset(rules: &mut [AvailabilityRule], preset: AvailabilityPreset) {
    for rule in rules.iter_mut() {
        rule.is_available = match preset {
            AvailabilityPreset::WeekdaysOnly => (1..=5).contains(&rule.day_of_week),
            AvailabilityPreset::WeekendsOnly => rule.day_of_week == 0 || rule.day_of_week == 6,
        };
    }
}

/// Loads and replaces a mentor's availability rules
pub struct AvailabilityService<G: DataGateway + ?Sized> {
    gateway: Rc<G>,
}

impl<G: DataGateway + ?Sized> AvailabilityService<G> {
    pub fn new(gateway: Rc<G>) -> Self {
        Self { gateway }
    }

    /// Rules ordered by weekday, or the default week when none are stored
    pub async fn load(&self, mentor_id: Uuid) -> ServiceResult<Vec<AvailabilityRule>> {
        let query = Query::from(tables::MENTOR_AVAILABILITY)
            .eq("mentor_id", mentor_id)
            .order("day_of_week", true);
        let rules: Vec<AvailabilityRule> = fetch_all(self.gateway.as_ref(), &query).await?;

        if rules.is_empty() {
            info!("📅 AVAILABILITY: No rules stored for {}, using default week", mentor_id);
            return Ok(AvailabilityRule::default_week());
        }

        info!("📅 AVAILABILITY: Loaded {} rules for {}", rules.len(), mentor_id);
        Ok(rules)
    }

    /// Replace the stored rule set: delete everything, then insert `rules`
    pub async fn save(&self, mentor_id: Uuid, rules: &[AvailabilityRule]) -> ServiceResult<()> {
        info!("📅 AVAILABILITY: Saving {} rules for {}", rules.len(), mentor_id);

        let filters = [Filter::eq("mentor_id", mentor_id)];
        if let Err(err) = self
            .gateway
            .delete(tables::MENTOR_AVAILABILITY, &filters)
            .await
        {
            warn!("📅 AVAILABILITY: Failed to clear existing rules: {}", err);
            return Err(err.into());
        }

        let rows: Vec<NewAvailabilityRule> = rules
            .iter()
            .map(|rule| NewAvailabilityRule {
                mentor_id,
                day_of_week: rule.day_of_week,
                start_time: rule.start_time.clone(),
                end_time: rule.end_time.clone(),
                is_available: rule.is_available,
            })
            .collect();
        self.gateway
            .insert(tables::MENTOR_AVAILABILITY, to_row(&rows)?)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{GatewayCall, InMemoryGateway};
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_toggle_flips_only_that_weekday() {
        let mut rules = AvailabilityRule::default_week();
        let before = rules.clone();
        // 2024-03-06 is a Wednesday
        toggle_day(&mut rules, date(2024, 3, 6));

        for (old, new) in before.iter().zip(rules.iter()) {
            if old.day_of_week == 3 {
                assert_eq!(new.is_available, !old.is_available);
            } else {
                assert_eq!(old, new);
            }
        }
        assert!(!is_available_on(&rules, date(2024, 3, 6)));
    }

    #[test]
    fn test_toggle_without_rule_is_noop() {
        let mut rules: Vec<AvailabilityRule> = AvailabilityRule::default_week()
            .into_iter()
            .filter(|rule| rule.day_of_week != 2)
            .collect();
        let before = rules.clone();
        toggle_day(&mut rules, date(2024, 3, 5));
        assert_eq!(rules, before);
        assert!(!is_available_on(&rules, date(2024, 3, 5)));
    }

    #[test]
    fn test_presets() {
        let mut rules = AvailabilityRule::default_week();
        apply_preset(&mut rules, AvailabilityPreset::WeekendsOnly);
        let available: Vec<u8> = rules.iter().filter(|r| r.is_available).map(|r| r.day_of_week).collect();
        assert_eq!(available, vec![0, 6]);

        apply_preset(&mut rules, AvailabilityPreset::WeekdaysOnly);
        let available: Vec<u8> = rules.iter().filter(|r| r.is_available).map(|r| r.day_of_week).collect();
        assert_eq!(available, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_edit_rule() {
        let mut rules = AvailabilityRule::default_week();
        edit_rule(&mut rules, 1, RuleEdit::StartTime("10:30".to_string()));
        edit_rule(&mut rules, 1, RuleEdit::Available(false));
        assert_eq!(rules[1].start_time, "10:30");
        assert!(!rules[1].is_available);
        assert_eq!(rules[2].start_time, "09:00");
    }

    #[tokio::test]
    async fn test_load_defaults_when_empty() {
        let gateway = Rc::new(InMemoryGateway::new());
        let service = AvailabilityService::new(gateway);
        let rules = service.load(Uuid::new_v4()).await.unwrap();
        assert_eq!(rules, AvailabilityRule::default_week());
    }

    #[tokio::test]
    async fn test_load_orders_by_weekday() {
        let mentor = Uuid::new_v4();
        let gateway = Rc::new(InMemoryGateway::new());
        gateway.seed(
            tables::MENTOR_AVAILABILITY,
            vec![
                json!({"mentor_id": mentor, "day_of_week": 3, "start_time": "09:00:00", "end_time": "12:00:00", "is_available": true}),
                json!({"mentor_id": mentor, "day_of_week": 1, "start_time": "09:00:00", "end_time": "17:00:00", "is_available": true}),
                json!({"mentor_id": Uuid::new_v4(), "day_of_week": 0, "start_time": "09:00", "end_time": "17:00", "is_available": true}),
            ],
        );
        let service = AvailabilityService::new(gateway);
        let rules = service.load(mentor).await.unwrap();
        let days: Vec<u8> = rules.iter().map(|r| r.day_of_week).collect();
        assert_eq!(days, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_save_deletes_before_inserting() {
        let mentor = Uuid::new_v4();
        let gateway = Rc::new(InMemoryGateway::new());
        gateway.seed(
            tables::MENTOR_AVAILABILITY,
            vec![json!({"mentor_id": mentor, "day_of_week": 1, "start_time": "08:00", "end_time": "09:00", "is_available": false})],
        );
        let service = AvailabilityService::new(gateway.clone());

        service.save(mentor, &AvailabilityRule::default_week()).await.unwrap();

        let calls = gateway.calls();
        assert_eq!(
            calls,
            vec![
                GatewayCall::Delete(tables::MENTOR_AVAILABILITY.to_string()),
                GatewayCall::Insert(tables::MENTOR_AVAILABILITY.to_string()),
            ]
        );
        let stored = gateway.rows(tables::MENTOR_AVAILABILITY);
        assert_eq!(stored.len(), 7);
        assert!(stored.iter().all(|row| row["mentor_id"] == json!(mentor)));
    }

    #[tokio::test]
    async fn test_save_stops_when_delete_fails() {
        let gateway = Rc::new(InMemoryGateway::new());
        gateway.fail_table(tables::MENTOR_AVAILABILITY, "permission denied");
        let service = AvailabilityService::new(gateway.clone());

        let result = service.save(Uuid::new_v4(), &AvailabilityRule::default_week()).await;
        assert!(result.is_err());
        assert_eq!(gateway.calls().len(), 1);
    }
}
