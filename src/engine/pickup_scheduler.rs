// ==========================================
// 仓储履约装箱系统 - 提货日期计算
// ==========================================
// 职责: 按提货策略，由今天与 MABD 推出提货日期
// WINDOW: min = next(today + 准备期), max = next(MABD - 在途缓冲)
//         min <= max 取 max，否则取 min；仅当结果早于今天时拒绝
// STRICT: pickup = next(MABD - 在途缓冲)
//         早于今天 / 准备期不足 / 在途期不足 均拒绝
// 红线: MABD 缺失一律无法确定提货日期
// ==========================================

use crate::domain::types::PickupPolicy;
use crate::engine::calendar::BusinessDayCalendar;
use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

/// 提货日期无法确定的原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PickupRejection {
    #[error("发运单缺少 MABD，无法确定提货日期")]
    MissingMabd,

    #[error("提货日期 {pickup} 早于今天 {today}")]
    BeforeToday { pickup: NaiveDate, today: NaiveDate },

    #[error("提货日期 {pickup} 距今天仅 {business_days} 个工作日，准备期不足")]
    InsufficientLeadTime { pickup: NaiveDate, business_days: u32 },

    #[error("提货日期 {pickup} 至 MABD {mabd} 仅 {business_days} 个工作日，在途期不足")]
    InsufficientTransitTime {
        pickup: NaiveDate,
        mabd: NaiveDate,
        business_days: u32,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct PickupScheduler {
    calendar: BusinessDayCalendar,
    policy: PickupPolicy,
    lead_business_days: u32,
    transit_buffer_business_days: u32,
}

impl PickupScheduler {
    pub fn new(policy: PickupPolicy, lead_business_days: u32, transit_buffer_business_days: u32) -> Self {
        Self {
            calendar: BusinessDayCalendar::new(),
            policy,
            lead_business_days,
            transit_buffer_business_days,
        }
    }

    pub fn resolve(&self, mabd: Option<NaiveDate>, today: NaiveDate) -> Result<NaiveDate, PickupRejection> {
        let mabd = mabd.ok_or(PickupRejection::MissingMabd)?;
        let latest = self.calendar.next_business_day(
            self.calendar
                .subtract_business_days(mabd, self.transit_buffer_business_days),
        );

        let result = match self.policy {
            PickupPolicy::Window => self.resolve_window(latest, today),
            PickupPolicy::Strict => self.resolve_strict(latest, mabd, today),
        };
        debug!(policy = %self.policy, %mabd, %today, ?result, "提货日期计算");
        result
    }

    fn resolve_window(&self, latest: NaiveDate, today: NaiveDate) -> Result<NaiveDate, PickupRejection> {
        let earliest = self
            .calendar
            .next_business_day(self.calendar.add_business_days(today, self.lead_business_days));

        let pickup = if earliest <= latest { latest } else { earliest };
        if pickup < today {
            return Err(PickupRejection::BeforeToday { pickup, today });
        }
        Ok(pickup)
    }

    fn resolve_strict(
        &self,
        pickup: NaiveDate,
        mabd: NaiveDate,
        today: NaiveDate,
    ) -> Result<NaiveDate, PickupRejection> {
        if pickup < today {
            return Err(PickupRejection::BeforeToday { pickup, today });
        }

        let lead = self.calendar.count_business_days_between(today, pickup);
        if lead <= self.lead_business_days {
            return Err(PickupRejection::InsufficientLeadTime {
                pickup,
                business_days: lead,
            });
        }

        // 两端计入，缓冲 2 天时 <= 1 视为不足
        let transit = self.calendar.count_business_days_between(pickup, mabd);
        if transit < self.transit_buffer_business_days {
            return Err(PickupRejection::InsufficientTransitTime {
                pickup,
                mabd,
                business_days: transit,
            });
        }

        Ok(pickup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, day).unwrap()
    }

    fn window() -> PickupScheduler {
        PickupScheduler::new(PickupPolicy::Window, 2, 2)
    }

    fn strict() -> PickupScheduler {
        PickupScheduler::new(PickupPolicy::Strict, 2, 2)
    }

    #[test]
    fn test_window_prefers_latest_pickup() {
        // 今天 10-12 周一，MABD 10-30 周五 → 最晚 10-27 周二
        assert_eq!(window().resolve(Some(d(10, 30)), d(10, 12)), Ok(d(10, 27)));
    }

    #[test]
    fn test_window_falls_back_to_earliest_when_window_closed() {
        // 今天 10-26 周一: earliest = 10-28, latest = 10-27 → 10-28
        assert_eq!(window().resolve(Some(d(10, 30)), d(10, 26)), Ok(d(10, 28)));
        // 今天 10-29 周四: earliest = 11-02 周一（晚于 MABD 仍接受）
        assert_eq!(window().resolve(Some(d(10, 30)), d(10, 29)), Ok(d(11, 2)));
    }

    #[test]
    fn test_weekend_mabd_rolls_forward() {
        // MABD 10-31 周六 → 倒推 10-28 周三
        assert_eq!(window().resolve(Some(d(10, 31)), d(10, 12)), Ok(d(10, 28)));
    }

    #[test]
    fn test_strict_accepts_comfortable_window() {
        assert_eq!(strict().resolve(Some(d(10, 30)), d(10, 12)), Ok(d(10, 27)));
    }

    #[test]
    fn test_strict_rejects_short_lead() {
        // 10-26 → 10-27 两端计入共 2 个工作日
        assert_eq!(
            strict().resolve(Some(d(10, 30)), d(10, 26)),
            Err(PickupRejection::InsufficientLeadTime {
                pickup: d(10, 27),
                business_days: 2
            })
        );
    }

    #[test]
    fn test_strict_rejects_pickup_before_today() {
        assert_eq!(
            strict().resolve(Some(d(10, 30)), d(10, 29)),
            Err(PickupRejection::BeforeToday {
                pickup: d(10, 27),
                today: d(10, 29)
            })
        );
    }

    #[test]
    fn test_missing_mabd_is_unresolved_under_both_policies() {
        assert_eq!(window().resolve(None, d(10, 12)), Err(PickupRejection::MissingMabd));
        assert_eq!(strict().resolve(None, d(10, 12)), Err(PickupRejection::MissingMabd));
    }

    #[test]
    fn test_rejection_messages_are_readable() {
        let msg = PickupRejection::InsufficientLeadTime {
            pickup: d(10, 27),
            business_days: 2,
        }
        .to_string();
        assert!(msg.contains("2026-10-27"));
        assert!(msg.contains("准备期不足"));
    }

    #[test]
    fn test_rejection_converts_into_std_error() {
        let rejection = PickupRejection::InsufficientTransitTime {
            pickup: d(10, 27),
            mabd: d(10, 30),
            business_days: 2,
        };
        let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(rejection.clone());
        assert_eq!(boxed.to_string(), rejection.to_string());
        assert!(boxed.to_string().contains("在途期不足"));

        let err: anyhow::Error = PickupRejection::MissingMabd.into();
        assert_eq!(err.downcast_ref::<PickupRejection>(), Some(&PickupRejection::MissingMabd));
    }
}
