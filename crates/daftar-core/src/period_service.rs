//! Accounting period lifecycle: open, record, close.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use daftar_domain::{BalanceTotals, Book, EntryDraft, Period, PeriodError, PeriodSummary};

use crate::{time::Clock, CoreError};

/// Request body for opening a period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPeriod {
    pub name: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

pub struct PeriodService;

impl PeriodService {
    /// Opens a new active period, closing every other active one first.
    ///
    /// A force-closed period ends on the new start date, or on its own start
    /// date when that is later.
    pub fn open(book: &mut Book, request: NewPeriod, clock: &dyn Clock) -> Result<Uuid, CoreError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("period name is required".into()));
        }
        let start = request.start_date.unwrap_or_else(|| clock.today());

        for period in book.periods.iter_mut().filter(|period| period.is_active()) {
            let end = start.max(period.start_date);
            let summary = period
                .close(end)
                .map_err(|err| Self::map_error(period.id, err))?;
            info!(id = %period.id, profit = %summary.profit, "period closed by newer period");
        }

        let period = Period::open(name, start);
        let id = period.id;
        book.periods.push(period);
        info!(%id, %start, "period opened");
        Ok(id)
    }

    /// Closes an active period and freezes its summary.
    pub fn close(
        book: &mut Book,
        id: Uuid,
        end_date: Option<NaiveDate>,
        clock: &dyn Clock,
    ) -> Result<PeriodSummary, CoreError> {
        let end = end_date.unwrap_or_else(|| clock.today());
        let period = book.period_mut(id).ok_or(CoreError::PeriodNotFound(id))?;
        let summary = period.close(end).map_err(|err| Self::map_error(id, err))?;
        info!(
            %id,
            income = %summary.total_income,
            expense = %summary.total_expense,
            "period closed"
        );
        Ok(summary)
    }

    /// Appends an income (debit) or expense (credit) entry to an active period.
    pub fn record(
        book: &mut Book,
        id: Uuid,
        draft: EntryDraft,
        clock: &dyn Clock,
    ) -> Result<Uuid, CoreError> {
        if draft.has_negative_side() {
            return Err(CoreError::Validation("debit and credit must not be negative".into()));
        }
        if draft.debit == Decimal::ZERO && draft.credit == Decimal::ZERO {
            return Err(CoreError::Validation("entry needs a debit or a credit".into()));
        }
        let period = book.period_mut(id).ok_or(CoreError::PeriodNotFound(id))?;
        let totals = BalanceTotals::of(&period.entries);
        if totals.total_debit.checked_add(draft.debit).is_none()
            || totals.total_credit.checked_add(draft.credit).is_none()
        {
            return Err(CoreError::Validation(format!(
                "amount is too large for period {}",
                period.name
            )));
        }
        period
            .record(draft, clock.now())
            .map_err(|err| Self::map_error(id, err))
    }

    pub fn active(book: &Book) -> Option<&Period> {
        book.active_periods().last()
    }

    pub fn get(book: &Book, id: Uuid) -> Result<&Period, CoreError> {
        book.period(id).ok_or(CoreError::PeriodNotFound(id))
    }

    /// Periods by start date, latest first.
    pub fn list(book: &Book) -> Vec<&Period> {
        let mut periods: Vec<&Period> = book.periods.iter().collect();
        periods.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        periods
    }

    fn map_error(id: Uuid, err: PeriodError) -> CoreError {
        match err {
            PeriodError::AlreadyClosed => CoreError::PeriodClosed(id),
            PeriodError::EndBeforeStart => CoreError::Validation(err.to_string()),
        }
    }
}
