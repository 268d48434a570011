//! 지출 품의 문서 생성 (개요 + 품의서). 입출력 없는 순수 함수만 둔다.

use chrono::{Datelike, NaiveDate};

use super::numeral::{format_thousands, number_to_korean};
use crate::models::{CartItem, CartTable, CartVariant, ExpenseDocument};

/// 제목/목적이 비어 있을 때 안내 문구
pub const MISSING_INPUT_MESSAGE: &str = "품의 제목과 목적을 입력하면 문서를 생성합니다.";

/// "{품명}({규격}) : {단가}원 × {수량}개 = {금액}원" (규격이 없으면 괄호 생략)
pub fn calculation_line(item: &CartItem) -> String {
    let label = if item.spec.is_empty() {
        item.name.clone()
    } else {
        format!("{}({})", item.name, item.spec)
    };
    format!(
        "{} : {}원 × {}개 = {}원",
        label,
        format_thousands(item.unit_price),
        item.quantity,
        format_thousands(item.amount())
    )
}

/// 문서를 만들지 않은 이유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentSkip {
    /// 추출된 품목이 없음
    EmptyTable,
    /// 기본 형식 표는 품의 문서 대상이 아님
    BasicVariant,
    /// 제목 또는 목적이 비어 있음
    MissingInput,
}

impl DocumentSkip {
    pub fn message(&self) -> &'static str {
        match self {
            DocumentSkip::EmptyTable => "추출된 품목이 없어 문서를 생성하지 않았습니다.",
            DocumentSkip::BasicVariant => BASIC_VARIANT_MESSAGE,
            DocumentSkip::MissingInput => MISSING_INPUT_MESSAGE,
        }
    }
}

/// 기본 형식 표에 대한 안내 문구
pub const BASIC_VARIANT_MESSAGE: &str = "품의 문서는 에듀파인(procurement) 형식에서만 생성합니다.";

/// 에듀파인 형식이고 제목과 목적이 모두 있으면 문서 생성
pub fn build_if_ready(
    table: &CartTable,
    title: &str,
    purpose: &str,
    date: NaiveDate,
) -> Result<ExpenseDocument, DocumentSkip> {
    if table.variant != CartVariant::Procurement {
        tracing::info!("Basic variant table, skipping document generation");
        return Err(DocumentSkip::BasicVariant);
    }
    if title.trim().is_empty() || purpose.trim().is_empty() {
        tracing::info!("Title or purpose missing, skipping document generation");
        return Err(DocumentSkip::MissingInput);
    }
    Ok(build_expense_document(table, title.trim(), purpose.trim(), date))
}

/// 합계의 한글 금액 표기. 음수는 "마이너스"를 앞에 붙인다.
fn korean_amount(total: i64) -> String {
    let korean = number_to_korean(total.unsigned_abs());
    if total < 0 {
        format!("마이너스{}", korean)
    } else {
        korean
    }
}

pub fn build_expense_document(
    table: &CartTable,
    title: &str,
    purpose: &str,
    date: NaiveDate,
) -> ExpenseDocument {
    let total = table.grand_total();
    let total_text = format_thousands(total);
    let korean = korean_amount(total);

    let names = table
        .items
        .iter()
        .map(|i| i.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let lines: Vec<String> = table.items.iter().map(calculation_line).collect();

    let overview = format!(
        "□ 개요\n\
         \u{20}○ 목적: {purpose}\n\
         \u{20}○ 품목: {names}\n\
         \u{20}○ 소요 예산: 금{total_text}원 (금{korean})\n\
         \n\
         □ 산출 내역\n\
         {calc}",
        calc = bullet_lines(&lines, " - "),
    );

    let year = date.year();
    let request = format!(
        "{title}\n\
         \n\
         기안일자: {date}\n\
         회계연도: {year}\n\
         \n\
         1. {purpose}을(를) 위하여 아래와 같이 물품 구입을 품의하고자 합니다.\n\
         \n\
         2. 구입 내역\n\
         \u{20} 가. 품    목: {names}\n\
         \u{20} 나. 소요 예산: 금{total_text}원(금{korean})\n\
         \u{20} 다. 산출 기초\n\
         {calc}\n\
         \u{20} 라. 예산 과목: {year}회계연도 학교운영비\n\
         \n\
         붙임  구입 물품 내역 1부.  끝.",
        date = date.format("%Y. %-m. %-d."),
        calc = bullet_lines(&lines, "     - "),
    );

    ExpenseDocument { overview, request }
}

fn bullet_lines(lines: &[String], prefix: &str) -> String {
    lines
        .iter()
        .map(|l| format!("{prefix}{l}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 다운로드용 텍스트 파일: 두 문서를 구분 배너 아래 이어 붙임
pub fn render_text_file(document: &ExpenseDocument) -> String {
    format!(
        "==================== 개요 ====================\n\
         {}\n\
         \n\
         ==================== 품의서 ====================\n\
         {}\n",
        document.overview, document.request
    )
}
