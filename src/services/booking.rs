use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::payment::PAYMENT_METHOD_CARD;
use crate::models::seat_transaction::{ACTION_BOOK, ACTION_CANCEL};
use crate::models::ticket::{PurchasedTicket, TICKET_REFUNDED, TICKET_VALID};
use crate::services::{dedup_ids, LockedSeat, LOCK_SEATS_SQL};

/// Everything a successful purchase produced.
#[derive(Debug, Serialize)]
pub struct BookingReceipt {
    pub payment_id: Uuid,
    pub ticket_ids: Vec<Uuid>,
    pub amount: f64,
}

/// One cent; the client total only has to agree to that precision.
const AMOUNT_TOLERANCE: f64 = 0.01;

fn amounts_match(expected: f64, provided: f64) -> bool {
    (expected - provided).abs() < AMOUNT_TOLERANCE
}

/// Direct purchase of AVAILABLE seats, one atomic unit of work.
///
/// Re-reads the seats under exclusive locks, prices them, writes the
/// payment, tickets and audit rows, and commits once. Any failure rolls
/// back everything; the losing side of a race observes a non-AVAILABLE
/// seat and fails with zero side effects.
pub async fn book(pool: &PgPool, buyer_name: Option<&str>, seat_ids: &[Uuid]) -> Result<BookingReceipt> {
    if seat_ids.is_empty() {
        return Err(AppError::Validation("no seats selected".to_string()));
    }

    let ids = dedup_ids(seat_ids);
    let mut tx = pool.begin().await?;

    let buyer_id = find_or_create_buyer(&mut tx, buyer_name).await?;
    let seats = lock_seats(&mut tx, &ids).await?;

    let unavailable: Vec<Uuid> = seats
        .iter()
        .filter(|s| !s.is_available())
        .map(|s| s.id)
        .collect();
    if !unavailable.is_empty() {
        tx.rollback().await?;
        warn!(buyer = %buyer_id, rejected = unavailable.len(), "booking lost the race");
        return Err(AppError::SeatUnavailable(unavailable));
    }

    let total: f64 = seats.iter().map(|s| s.price).sum();
    let receipt = settle(&mut tx, buyer_id, &seats, total).await?;
    tx.commit().await?;

    info!(
        buyer = %buyer_id,
        payment = %receipt.payment_id,
        seats = seats.len(),
        amount = receipt.amount,
        "booking committed"
    );
    Ok(receipt)
}

/// Hold-then-purchase path: converts the caller's own ON_HOLD seats into
/// a booking. The server-side price sum must agree with the amount the
/// caller was shown, within one cent.
pub async fn confirm_hold(
    pool: &PgPool,
    holder_id: Uuid,
    seat_ids: &[Uuid],
    amount: f64,
) -> Result<BookingReceipt> {
    if seat_ids.is_empty() {
        return Err(AppError::Validation("no seats selected".to_string()));
    }

    let ids = dedup_ids(seat_ids);
    let mut tx = pool.begin().await?;

    let seats = lock_seats(&mut tx, &ids).await?;

    let not_mine: Vec<Uuid> = seats
        .iter()
        .filter(|s| !s.confirmable_by(holder_id))
        .map(|s| s.id)
        .collect();
    if !not_mine.is_empty() {
        tx.rollback().await?;
        warn!(holder = %holder_id, rejected = not_mine.len(), "confirm on seats not held");
        return Err(AppError::SeatUnavailable(not_mine));
    }

    let total: f64 = seats.iter().map(|s| s.price).sum();
    if !amounts_match(total, amount) {
        // Never trust the client total; re-derive and refuse on drift.
        return Err(AppError::AmountMismatch {
            expected: total,
            provided: amount,
        });
    }

    let receipt = settle(&mut tx, holder_id, &seats, total).await?;
    tx.commit().await?;

    info!(
        holder = %holder_id,
        payment = %receipt.payment_id,
        seats = seats.len(),
        "hold confirmed"
    );
    Ok(receipt)
}

/// Authorization is decided before the ticket's refund state is
/// disclosed; a non-owner probing an arbitrary ticket id learns nothing
/// beyond NotAuthorized.
fn refund_gate(ticket_status: &str, buyer_id: Uuid, caller: &AuthUser) -> Result<()> {
    if !caller.is_admin && buyer_id != caller.user_id {
        return Err(AppError::NotAuthorized);
    }
    if ticket_status == TICKET_REFUNDED {
        return Err(AppError::AlreadyRefunded);
    }
    if ticket_status != TICKET_VALID {
        return Err(AppError::TicketNotFound);
    }
    Ok(())
}

/// Refund one ticket: ticket to REFUNDED, its seat back to AVAILABLE,
/// CANCEL audit row. Only the buyer or an admin may refund. The buyer is
/// resolved through the BOOK audit row, not `seats.user_id`, which a
/// prior refund clears.
pub async fn refund(pool: &PgPool, ticket_id: Uuid, caller: &AuthUser) -> Result<()> {
    let mut tx = pool.begin().await?;

    #[derive(sqlx::FromRow)]
    struct TicketRow {
        status: String,
        seat_id: Uuid,
        buyer_id: Uuid,
    }

    let row: Option<TicketRow> = sqlx::query_as(
        "SELECT t.status, t.seat_id, tr.user_id AS buyer_id
         FROM tickets t
         JOIN seats s ON s.id = t.seat_id
         JOIN seat_transactions tr ON tr.ticket_id = t.id AND tr.action = $2
         WHERE t.id = $1
         FOR UPDATE OF t, s",
    )
    .bind(ticket_id)
    .bind(ACTION_BOOK)
    .fetch_optional(&mut *tx)
    .await?;

    let ticket = row.ok_or(AppError::TicketNotFound)?;
    refund_gate(&ticket.status, ticket.buyer_id, caller)?;

    sqlx::query("UPDATE tickets SET status = $1 WHERE id = $2")
        .bind(TICKET_REFUNDED)
        .bind(ticket_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "UPDATE seats
         SET status = 'AVAILABLE', user_id = NULL, hold_expires_at = NULL
         WHERE id = $1",
    )
    .bind(ticket.seat_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO seat_transactions (seat_id, user_id, action, ticket_id)
         VALUES ($1, $2, $3, $4)",
    )
    .bind(ticket.seat_id)
    .bind(caller.user_id)
    .bind(ACTION_CANCEL)
    .bind(ticket_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(ticket = %ticket_id, caller = %caller.user_id, "ticket refunded");
    Ok(())
}

/// A user's purchase history, resolved through the audit trail so refunded
/// tickets (whose seats no longer point at the buyer) still show up.
pub async fn purchased_tickets(pool: &PgPool, user_id: Uuid) -> Result<Vec<PurchasedTicket>> {
    let tickets = sqlx::query_as::<_, PurchasedTicket>(
        "SELECT t.id AS ticket_id, t.status AS ticket_status, t.price,
                p.id AS payment_id, p.created_at AS payment_date,
                e.name AS event_name, e.event_date,
                s.id AS seat_id, s.x, s.y, st.name AS seat_type
         FROM seat_transactions tr
         JOIN tickets t ON t.id = tr.ticket_id
         JOIN payments p ON p.id = t.payment_id
         JOIN seats s ON s.id = t.seat_id
         JOIN events e ON e.id = s.event_id
         JOIN seat_types st ON st.id = s.seat_type_id
         WHERE tr.user_id = $1 AND tr.action = $2
         ORDER BY p.created_at DESC, s.y, s.x",
    )
    .bind(user_id)
    .bind(ACTION_BOOK)
    .fetch_all(pool)
    .await?;

    Ok(tickets)
}

async fn lock_seats(
    tx: &mut Transaction<'_, Postgres>,
    ids: &[Uuid],
) -> Result<Vec<LockedSeat>> {
    let seats: Vec<LockedSeat> = sqlx::query_as(LOCK_SEATS_SQL)
        .bind(ids)
        .fetch_all(&mut **tx)
        .await?;

    if seats.len() != ids.len() {
        return Err(AppError::SeatsNotFound);
    }
    if seats.iter().any(|s| s.event_cancelled()) {
        return Err(AppError::EventCancelled);
    }
    Ok(seats)
}

async fn find_or_create_buyer(
    tx: &mut Transaction<'_, Postgres>,
    buyer_name: Option<&str>,
) -> Result<Uuid> {
    if let Some(name) = buyer_name {
        if let Some(id) =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE user_name = $1")
                .bind(name)
                .fetch_optional(&mut **tx)
                .await?
        {
            return Ok(id);
        }
    }

    let user_name = buyer_name
        .map(str::to_string)
        .unwrap_or_else(|| format!("guest_{}", Uuid::new_v4().simple()));

    // Throwaway credential; guest accounts only exist to own tickets.
    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (name, user_name, password) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(buyer_name.unwrap_or("Guest"))
    .bind(&user_name)
    .bind(Uuid::new_v4().to_string())
    .fetch_one(&mut **tx)
    .await?;

    Ok(id)
}

/// Steps 6-7 of the purchase: payment row, then per seat the BOOKED flip,
/// the price-snapshotted ticket and the BOOK audit row. Runs inside the
/// caller's transaction; the caller commits.
async fn settle(
    tx: &mut Transaction<'_, Postgres>,
    buyer_id: Uuid,
    seats: &[LockedSeat],
    total: f64,
) -> Result<BookingReceipt> {
    let payment_id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO payments (amount, method) VALUES ($1, $2) RETURNING id",
    )
    .bind(total)
    .bind(PAYMENT_METHOD_CARD)
    .fetch_one(&mut **tx)
    .await?;

    let mut ticket_ids = Vec::with_capacity(seats.len());
    for seat in seats {
        sqlx::query(
            "UPDATE seats
             SET status = 'BOOKED', user_id = $1, hold_expires_at = NULL
             WHERE id = $2",
        )
        .bind(buyer_id)
        .bind(seat.id)
        .execute(&mut **tx)
        .await?;

        let ticket_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO tickets (seat_id, payment_id, price, status)
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(seat.id)
        .bind(payment_id)
        .bind(seat.price)
        .bind(TICKET_VALID)
        .fetch_one(&mut **tx)
        .await?;

        sqlx::query(
            "INSERT INTO seat_transactions (seat_id, user_id, action, ticket_id)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(seat.id)
        .bind(buyer_id)
        .bind(ACTION_BOOK)
        .bind(ticket_id)
        .execute(&mut **tx)
        .await?;

        ticket_ids.push(ticket_id);
    }

    Ok(BookingReceipt {
        payment_id,
        ticket_ids,
        amount: total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_within_a_cent_match() {
        assert!(amounts_match(30.0, 30.0));
        assert!(amounts_match(30.0, 30.005));
        assert!(amounts_match(10.1 + 10.2, 20.3));
    }

    #[test]
    fn totals_off_by_a_cent_or_more_do_not() {
        assert!(!amounts_match(30.0, 30.01));
        assert!(!amounts_match(30.0, 29.0));
        assert!(!amounts_match(0.0, 10.0));
    }

    fn caller(user_id: Uuid, is_admin: bool) -> AuthUser {
        AuthUser {
            user_id,
            user_name: "buyer".to_string(),
            is_admin,
        }
    }

    #[test]
    fn non_owner_gets_not_authorized_even_for_a_refunded_ticket() {
        let buyer = Uuid::new_v4();
        let stranger = caller(Uuid::new_v4(), false);
        assert!(matches!(
            refund_gate(TICKET_REFUNDED, buyer, &stranger),
            Err(AppError::NotAuthorized)
        ));
        assert!(matches!(
            refund_gate(TICKET_VALID, buyer, &stranger),
            Err(AppError::NotAuthorized)
        ));
    }

    #[test]
    fn owner_refunding_twice_gets_already_refunded() {
        let buyer = Uuid::new_v4();
        assert!(matches!(
            refund_gate(TICKET_REFUNDED, buyer, &caller(buyer, false)),
            Err(AppError::AlreadyRefunded)
        ));
    }

    #[test]
    fn owner_and_admin_may_refund_a_valid_ticket() {
        let buyer = Uuid::new_v4();
        assert!(refund_gate(TICKET_VALID, buyer, &caller(buyer, false)).is_ok());
        assert!(refund_gate(TICKET_VALID, buyer, &caller(Uuid::new_v4(), true)).is_ok());
    }
}
