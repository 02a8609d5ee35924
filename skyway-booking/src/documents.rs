use rust_decimal::{Decimal, RoundingStrategy};
use skyway_shared::Notification;

use crate::models::{Booking, SeatPreference};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Render a currency amount with exactly two decimals.
pub fn format_amount(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}

/// Plain-text booking confirmation: reference, flight, times, total, payment
/// reference and the passenger list.
pub fn confirmation_document(booking: &Booking) -> String {
    let mut doc = String::new();
    doc.push_str("Booking Confirmation\n\n");
    doc.push_str("Your booking has been confirmed!\n\n");
    doc.push_str("Booking Details\n");
    doc.push_str(&format!("Booking Reference: {}\n", booking.id));
    doc.push_str(&format!("Flight: {} ({})\n", booking.flight, booking.airline_name));
    doc.push_str(&format!("Departure: {}\n", booking.departure.format(DATE_FORMAT)));
    doc.push_str(&format!("Arrival: {}\n", booking.arrival.format(DATE_FORMAT)));
    doc.push_str(&format!("Total Price: ${}\n", format_amount(booking.total_price)));
    if let Some(reference) = booking.payment_details.refund_reference() {
        doc.push_str(&format!("Payment Reference: {}\n", reference.id()));
    }

    doc.push_str("\nPassengers:\n");
    for (index, passenger) in booking.passengers.iter().enumerate() {
        doc.push_str(&format!("{}. {}\n", index + 1, passenger.name));
        let pref = match passenger.seat_preference {
            Some(SeatPreference::Window) => "Window",
            Some(SeatPreference::Aisle) => "Aisle",
            Some(SeatPreference::Middle) => "Middle",
            None => "None",
        };
        doc.push_str(&format!("   Seat Preference: {}\n", pref));
    }

    doc.push_str("\nThank you for booking with us!\n");
    doc
}

pub fn confirmation_notice(to: &str, booking: &Booking) -> Notification {
    Notification::text(to, "Booking Confirmation", confirmation_document(booking))
}

pub fn cancellation_notice(to: &str, booking: &Booking) -> Notification {
    Notification::text(
        to,
        "Booking Cancellation Confirmation",
        format!(
            "Your booking with flight number {} has been cancelled. A refund of ${} will be processed \
             within 7 business days. If you have any questions, please contact our support.",
            booking.flight,
            format_amount(booking.total_price)
        ),
    )
}
