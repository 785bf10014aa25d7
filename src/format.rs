//! Input normalization for amounts typed into the form.

/// Insert `.` thousands separators into the integer part of a number.
///
/// Leading currency text and a decimal comma are kept as typed; existing
/// separators are dropped first so the result is the same for "45990" and
/// "45.990". Values without digits are returned unchanged.
pub fn group_thousands(value: &str) -> String {
    let value = value.trim();
    let Some(first_digit) = value.find(|c: char| c.is_ascii_digit()) else {
        return value.to_string();
    };
    let (prefix, number) = value.split_at(first_digit);
    let (integer, decimals) = match number.find(',') {
        Some(i) => (&number[..i], &number[i..]),
        None => (number, ""),
    };
    let digits: String = integer.chars().filter(char::is_ascii_digit).collect();
    if digits.len() + integer.matches('.').count() != integer.len() {
        // Something other than digits and dots; leave it alone
        return value.to_string();
    }

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    format!("{}{}{}", prefix, grouped, decimals)
}
