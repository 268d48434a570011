//! 금액 표기: 한글 숫자("일만이천원정")와 천 단위 구분 기호.

const DIGITS: [&str; 10] = ["", "일", "이", "삼", "사", "오", "육", "칠", "팔", "구"];
const SMALL_UNITS: [&str; 4] = ["", "십", "백", "천"];
const LARGE_UNITS: [&str; 5] = ["", "만", "억", "조", "경"];

/// 금액을 한글로 변환하고 "원정"을 붙임
///
/// 네 자리씩 끊어 각 자리의 0이 아닌 숫자만 읽는다. 0은 "영원정".
pub fn number_to_korean(amount: u64) -> String {
    if amount == 0 {
        return "영원정".to_string();
    }

    let mut groups: Vec<String> = Vec::new();
    let mut rest = amount;
    let mut group_idx = 0;

    while rest > 0 {
        let group = (rest % 10_000) as usize;
        rest /= 10_000;

        if group > 0 {
            let mut text = String::new();
            for pos in (0..4).rev() {
                let digit = group / 10usize.pow(pos as u32) % 10;
                if digit > 0 {
                    text.push_str(DIGITS[digit]);
                    text.push_str(SMALL_UNITS[pos]);
                }
            }
            text.push_str(LARGE_UNITS[group_idx]);
            groups.push(text);
        }
        group_idx += 1;
    }

    groups.reverse();
    let mut out = groups.concat();
    out.push_str("원정");
    out
}

/// 천 단위 콤마 (음수 허용)
pub fn format_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
