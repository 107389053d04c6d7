// ==========================================
// 仓储履约装箱系统 - 工作日日历
// ==========================================
// 职责: 工作日加减、区间计数、顺延到下一工作日
// 红线: 工作日 = 周一至周五，不含节假日
// 输出: 一律为日期（零点），不带时分秒
// ==========================================

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

// ==========================================
// BusinessDayCalendar - 工作日日历
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct BusinessDayCalendar;

impl BusinessDayCalendar {
    pub fn new() -> Self {
        Self
    }

    /// 是否工作日
    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// 截断到零点
    pub fn normalize(&self, datetime: NaiveDateTime) -> NaiveDateTime {
        NaiveDateTime::new(datetime.date(), NaiveTime::default())
    }

    /// 向后加 n 个工作日
    ///
    /// 周五 + 2 = 下周二；n = 0 时原样返回
    pub fn add_business_days(&self, date: NaiveDate, n: u32) -> NaiveDate {
        let mut current = date;
        let mut added = 0;
        while added < n {
            current += Duration::days(1);
            if self.is_business_day(current) {
                added += 1;
            }
        }
        current
    }

    /// 向前倒推 n 个工作日
    ///
    /// 返回的工作日与 `date` 之间恰好隔着 n 个完整工作日（在途缓冲）：
    /// 周一 - 2 = 上周三（中间隔周四、周五）
    ///
    /// n = 0 时返回 `date` 之前最近的工作日（不含 `date` 本身）：周一 - 0 = 上周五
    pub fn subtract_business_days(&self, date: NaiveDate, n: u32) -> NaiveDate {
        let mut current = date;
        let mut passed = 0;
        loop {
            current -= Duration::days(1);
            if !self.is_business_day(current) {
                continue;
            }
            if passed == n {
                return current;
            }
            passed += 1;
        }
    }

    /// 两日期之间的工作日数（两端都计入，与参数顺序无关）
    pub fn count_business_days_between(&self, a: NaiveDate, b: NaiveDate) -> u32 {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        let total_days = (end - start).num_days() + 1;

        // 整周部分直接按 5 天计
        let full_weeks = total_days / 7;
        let mut count = full_weeks * 5;

        let mut current = start + Duration::days(full_weeks * 7);
        while current <= end {
            if self.is_business_day(current) {
                count += 1;
            }
            current += Duration::days(1);
        }
        count as u32
    }

    /// 周末顺延到下一工作日（周六 +2，周日 +1，其余不变）
    pub fn next_business_day(&self, date: NaiveDate) -> NaiveDate {
        match date.weekday() {
            Weekday::Sat => date + Duration::days(2),
            Weekday::Sun => date + Duration::days(1),
            _ => date,
        }
    }
}
