//! Email body rendering.
//!
//! Maps an event tag plus recipient name and auxiliary data to a
//! human-readable message. Total over all event strings: unrecognized
//! events fall back to a generic message rather than failing, and
//! missing data fields are replaced with placeholder text.

use chrono::Utc;
use serde_json::Value;

/// Render the message body for an event.
///
/// Event names are matched case-sensitively. `data` carries free-form
/// interpolation fields; lookups tolerate both flat keys (`bookingId`)
/// and the nested `booking` object the mobile app sends.
pub fn render(event: &str, name: &str, data: &Value) -> String {
    // Same shape as JavaScript's Date.toDateString()
    let date = Utc::now().format("%a %b %d %Y");

    match event {
        "PAYMENT_SUCCESS" => format!(
            "Hello {name},\n\n\
             Your payment was successful\n\n\
             Booking Details:\n\
             - Status: Payment Confirmed\n\
             - Reference: {event}\n\
             - Date: {date}\n\n\
             You can now proceed with your hostel check-in via the app.\n\n\
             Thank you for choosing us.\n\
             - Hostel Booking App Team\n"
        ),

        "PASSWORD_RESET" => {
            let link = data
                .get("resetLink")
                .and_then(Value::as_str)
                .unwrap_or("Reset link will be provided by Auth");
            format!(
                "Hello {name},\n\n\
                 We received a request to reset your password.\n\n\
                 Reset link:\n\
                 {link}\n\n\
                 If you did not request this, please ignore this email.\n\n\
                 - Hostel Booking App Team\n"
            )
        }

        "EMAIL_VERIFICATION" => {
            let link = data
                .get("verifyLink")
                .and_then(Value::as_str)
                .unwrap_or("Verification link will be provided by Auth");
            format!(
                "Hello {name},\n\n\
                 Welcome to the Hostel Booking App\n\n\
                 Please verify your email using this link:\n\
                 {link}\n\n\
                 Once verified, you can proceed to book a hostel room.\n\n\
                 - Hostel Booking App Team\n"
            )
        }

        "PAYMENT_FAILED" => format!(
            "Hello {name},\n\n\
             Unfortunately, your payment attempt was not successful\n\n\
             Please try again or use a different payment method.\n\n\
             If the issue persists, contact support via the Hostel Booking App.\n\n\
             - Hostel Booking App Team\n"
        ),

        "BOOKING_CREATED" => {
            let booking_id = booking_field(data, "bookingId", "id").unwrap_or("N/A");
            let room = booking_field(data, "room", "room").unwrap_or("Not assigned");
            let check_in = booking_field(data, "checkIn", "checkIn").unwrap_or("TBA");
            let check_out = booking_field(data, "checkOut", "checkOut").unwrap_or("TBA");

            format!(
                "Hello {name},\n\n\
                 Your room has been successfully booked\n\n\
                 Booking Details:\n\
                 - Booking ID: {booking_id}\n\
                 - Room: {room}\n\
                 - Check-in: {check_in}\n\
                 - Check-out: {check_out}\n\
                 - Date: {date}\n\n\
                 You can view your booking in the Hostel Booking App.\n\n\
                 - Hostel Booking App Team\n"
            )
        }

        "BOOKING_CANCELLED" => {
            let booking_id = booking_field(data, "bookingId", "id").unwrap_or("N/A");

            format!(
                "Hello {name},\n\n\
                 Your hostel booking has been cancelled\n\n\
                 Booking Details:\n\
                 - Booking ID: {booking_id}\n\
                 - Date: {date}\n\n\
                 If this was not intended, please log in to the app and make a new booking.\n\n\
                 - Hostel Booking App Team\n"
            )
        }

        "CHECK_IN_REMINDER" => format!(
            "Hello {name},\n\n\
             This is a reminder that your hostel check-in date is approaching\n\n\
             Please ensure you have completed all required steps before arrival.\n\n\
             Safe travels!\n\
             - Hostel Booking App Team\n"
        ),

        _ => format!(
            "Hello {name},\n\n\
             You have a new notification from the Hostel Booking App.\n\n\
             - Hostel Booking App Team\n"
        ),
    }
}

/// Look up a booking field, preferring the flat key over `booking.<nested>`.
fn booking_field<'a>(data: &'a Value, flat: &str, nested: &str) -> Option<&'a str> {
    data.get(flat)
        .and_then(Value::as_str)
        .or_else(|| data.get("booking")?.get(nested)?.as_str())
}
