//! Fixed-size document views captured by the snapshot composer: ID cards,
//! salary slips, certificates and fee receipts.
//!
//! Views are plain records that deserialize from JSON and paint themselves
//! into a [`Scene`]; sizes are CSS pixels.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::money::{format_currency, CurrencyFormat};
use crate::snapshot::{
    DocumentKind, Scene, SnapshotView, TextAlign, GOLD, GREY, INK, MIST, NAVY, PAPER,
};

pub const ID_CARD_SIZE: (u32, u32) = (340, 214);
pub const SALARY_SLIP_SIZE: (u32, u32) = (794, 1123);
pub const CERTIFICATE_SIZE: (u32, u32) = (1123, 794);
pub const FEE_RECEIPT_SIZE: (u32, u32) = (794, 560);

/// Rows per salary slip column that fit above the net pay box.
pub const SLIP_MAX_ROWS: usize = 20;

fn date(d: NaiveDate) -> String {
    d.format("%d %b %Y").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CardHolder {
    #[default]
    Student,
    Teacher,
}

impl CardHolder {
    fn title(&self) -> &'static str {
        match self {
            CardHolder::Student => "STUDENT IDENTITY CARD",
            CardHolder::Teacher => "STAFF IDENTITY CARD",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdCard {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub holder: CardHolder,
    pub institute: String,
    /// Class and section, or department for staff.
    pub affiliation: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub blood_group: Option<String>,
    pub valid_until: NaiveDate,
    /// `data:image/...;base64,` URI.
    #[serde(default)]
    pub photo: Option<String>,
}

impl SnapshotView for IdCard {
    fn kind(&self) -> DocumentKind {
        DocumentKind::IdCard
    }

    fn external_id(&self) -> &str {
        &self.id
    }

    fn person_name(&self) -> &str {
        &self.name
    }

    fn size_px(&self) -> (u32, u32) {
        ID_CARD_SIZE
    }

    fn paint(&self, s: &mut Scene) {
        let (w, h) = (ID_CARD_SIZE.0 as f32, ID_CARD_SIZE.1 as f32);
        s.rect(0.0, 0.0, w, 44.0, NAVY);
        s.text(w / 2.0, 8.0, &self.institute, 13.0, true, PAPER, TextAlign::Center);
        s.text(w / 2.0, 26.0, self.holder.title(), 9.0, false, PAPER, TextAlign::Center);

        // Photo well
        s.rect(14.0, 56.0, 84.0, 104.0, MIST);
        match &self.photo {
            Some(src) => s.image(16.0, 58.0, 80.0, 100.0, src.clone()),
            None => s.text(56.0, 100.0, "PHOTO", 9.0, false, GREY, TextAlign::Center),
        }
        s.frame(14.0, 56.0, 84.0, 104.0, 1.0, GREY);

        let x = 112.0;
        s.text(x, 58.0, &self.name, 14.0, true, INK, TextAlign::Left);
        let mut rows = vec![
            ("ID", self.id.clone()),
            (
                match self.holder {
                    CardHolder::Student => "Class",
                    CardHolder::Teacher => "Dept",
                },
                self.affiliation.clone(),
            ),
        ];
        if let Some(phone) = &self.phone {
            rows.push(("Phone", phone.clone()));
        }
        if let Some(group) = &self.blood_group {
            rows.push(("Blood", group.clone()));
        }
        for (i, (label, value)) in rows.iter().enumerate() {
            let y = 82.0 + i as f32 * 17.0;
            s.text(x, y, *label, 9.0, true, GREY, TextAlign::Left);
            s.text(x + 44.0, y, value.clone(), 9.0, false, INK, TextAlign::Left);
        }

        s.rect(0.0, h - 28.0, w, 28.0, MIST);
        s.text(
            14.0,
            h - 20.0,
            format!("Valid until {}", date(self.valid_until)),
            8.0,
            false,
            INK,
            TextAlign::Left,
        );
        s.line(w - 110.0, h - 12.0, w - 14.0, h - 12.0, 0.8, GREY);
        s.frame(0.0, 0.0, w, h, 1.5, NAVY);
    }
}

/// A labelled amount on a salary slip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineItem {
    pub label: String,
    pub amount: i64,
}

impl LineItem {
    pub fn new(label: &str, amount: i64) -> Self {
        Self {
            label: label.to_string(),
            amount,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalarySlip {
    pub slip_id: String,
    pub employee_id: String,
    pub employee_name: String,
    pub designation: String,
    pub institute: String,
    /// e.g. "October 2026".
    pub period: String,
    pub earnings: Vec<LineItem>,
    #[serde(default)]
    pub deductions: Vec<LineItem>,
    #[serde(default)]
    pub paid_on: Option<NaiveDate>,
    #[serde(default)]
    pub currency: CurrencyFormat,
}

impl SalarySlip {
    pub fn total_earnings(&self) -> i64 {
        self.earnings.iter().map(|e| e.amount).sum()
    }

    pub fn total_deductions(&self) -> i64 {
        self.deductions.iter().map(|d| d.amount).sum()
    }

    pub fn net_pay(&self) -> i64 {
        self.total_earnings() - self.total_deductions()
    }

    /// At most [`SLIP_MAX_ROWS`] rows; the overflow is folded into one
    /// summed row so the column total is unchanged.
    fn visible_rows(&self, heading: &str, items: &[LineItem]) -> Vec<LineItem> {
        if items.len() <= SLIP_MAX_ROWS {
            return items.to_vec();
        }
        let keep = SLIP_MAX_ROWS - 1;
        let folded = &items[keep..];
        log::warn!(
            "salary slip {}: {} {heading} rows folded into one to fit the page",
            self.slip_id,
            folded.len()
        );
        let mut rows = items[..keep].to_vec();
        rows.push(LineItem {
            label: format!("Other ({} items)", folded.len()),
            amount: folded.iter().map(|item| item.amount).sum(),
        });
        rows
    }

    fn column(&self, s: &mut Scene, x: f32, y: f32, heading: &str, items: &[LineItem], total: i64) {
        let width = 327.0;
        s.rect(x, y, width, 30.0, NAVY);
        s.text(x + 12.0, y + 8.0, heading, 12.0, true, PAPER, TextAlign::Left);
        let mut row_y = y + 30.0;
        for (i, item) in items.iter().enumerate() {
            if i % 2 == 1 {
                s.rect(x, row_y, width, 28.0, MIST);
            }
            s.text(x + 12.0, row_y + 8.0, &item.label, 11.0, false, INK, TextAlign::Left);
            s.text(
                x + width - 12.0,
                row_y + 8.0,
                format_currency(item.amount, &self.currency),
                11.0,
                false,
                INK,
                TextAlign::Right,
            );
            row_y += 28.0;
        }
        s.line(x, row_y, x + width, row_y, 1.0, GREY);
        s.text(x + 12.0, row_y + 8.0, "Total", 11.0, true, INK, TextAlign::Left);
        s.text(
            x + width - 12.0,
            row_y + 8.0,
            format_currency(total, &self.currency),
            11.0,
            true,
            INK,
            TextAlign::Right,
        );
    }
}

impl SnapshotView for SalarySlip {
    fn kind(&self) -> DocumentKind {
        DocumentKind::SalarySlip
    }

    fn external_id(&self) -> &str {
        &self.slip_id
    }

    fn person_name(&self) -> &str {
        &self.employee_name
    }

    fn size_px(&self) -> (u32, u32) {
        SALARY_SLIP_SIZE
    }

    fn paint(&self, s: &mut Scene) {
        let (w, h) = (SALARY_SLIP_SIZE.0 as f32, SALARY_SLIP_SIZE.1 as f32);
        let margin = 60.0;

        s.rect(0.0, 0.0, w, 110.0, NAVY);
        s.text(w / 2.0, 30.0, &self.institute, 24.0, true, PAPER, TextAlign::Center);
        s.text(
            w / 2.0,
            68.0,
            format!("Salary Slip for {}", self.period),
            14.0,
            false,
            PAPER,
            TextAlign::Center,
        );

        let details = [
            ("Employee Name", self.employee_name.clone()),
            ("Employee ID", self.employee_id.clone()),
            ("Designation", self.designation.clone()),
            ("Slip No.", self.slip_id.clone()),
            (
                "Paid On",
                self.paid_on.map(date).unwrap_or_else(|| "-".to_string()),
            ),
        ];
        for (i, (label, value)) in details.iter().enumerate() {
            let y = 140.0 + i as f32 * 26.0;
            s.text(margin, y, *label, 12.0, true, GREY, TextAlign::Left);
            s.text(margin + 160.0, y, value.clone(), 12.0, false, INK, TextAlign::Left);
        }

        let table_y = 290.0;
        let earnings = self.visible_rows("earnings", &self.earnings);
        let deductions = self.visible_rows("deductions", &self.deductions);
        self.column(s, margin, table_y, "Earnings", &earnings, self.total_earnings());
        self.column(
            s,
            margin + 347.0,
            table_y,
            "Deductions",
            &deductions,
            self.total_deductions(),
        );

        let rows = earnings.len().max(deductions.len()) as f32;
        let net_y = table_y + 30.0 + rows * 28.0 + 60.0;
        s.rect(margin, net_y, w - 2.0 * margin, 48.0, MIST);
        s.frame(margin, net_y, w - 2.0 * margin, 48.0, 1.0, NAVY);
        s.text(margin + 16.0, net_y + 14.0, "Net Pay", 16.0, true, NAVY, TextAlign::Left);
        s.text(
            w - margin - 16.0,
            net_y + 14.0,
            format_currency(self.net_pay(), &self.currency),
            16.0,
            true,
            NAVY,
            TextAlign::Right,
        );

        s.text(
            w / 2.0,
            h - 60.0,
            "This is a computer-generated slip and does not require a signature.",
            10.0,
            false,
            GREY,
            TextAlign::Center,
        );
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certificate {
    pub certificate_id: String,
    pub recipient: String,
    pub institute: String,
    /// e.g. "Certificate of Completion".
    pub title: String,
    /// What the certificate is awarded for.
    pub achievement: String,
    #[serde(default)]
    pub grade: Option<String>,
    pub issued_on: NaiveDate,
    pub signatory_name: String,
    pub signatory_title: String,
}

impl SnapshotView for Certificate {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Certificate
    }

    fn external_id(&self) -> &str {
        &self.certificate_id
    }

    fn person_name(&self) -> &str {
        &self.recipient
    }

    fn size_px(&self) -> (u32, u32) {
        CERTIFICATE_SIZE
    }

    fn paint(&self, s: &mut Scene) {
        let (w, h) = (CERTIFICATE_SIZE.0 as f32, CERTIFICATE_SIZE.1 as f32);
        let cx = w / 2.0;
        s.background = [253, 251, 245, 255];
        s.frame(20.0, 20.0, w - 40.0, h - 40.0, 6.0, NAVY);
        s.frame(36.0, 36.0, w - 72.0, h - 72.0, 2.0, GOLD);

        s.text(cx, 90.0, &self.institute, 26.0, true, NAVY, TextAlign::Center);
        s.text(cx, 160.0, self.title.to_uppercase(), 38.0, true, GOLD, TextAlign::Center);
        s.text(cx, 250.0, "This is to certify that", 18.0, false, INK, TextAlign::Center);
        s.text(cx, 300.0, &self.recipient, 40.0, true, NAVY, TextAlign::Center);
        s.line(cx - 260.0, 352.0, cx + 260.0, 352.0, 1.5, GOLD);
        s.text(cx, 380.0, &self.achievement, 18.0, false, INK, TextAlign::Center);
        if let Some(grade) = &self.grade {
            s.text(
                cx,
                420.0,
                format!("with grade {grade}"),
                18.0,
                true,
                INK,
                TextAlign::Center,
            );
        }

        let foot = h - 190.0;
        s.text(140.0, foot, date(self.issued_on), 16.0, false, INK, TextAlign::Left);
        s.line(140.0, foot + 26.0, 380.0, foot + 26.0, 1.0, GREY);
        s.text(140.0, foot + 34.0, "Date of Issue", 13.0, false, GREY, TextAlign::Left);

        let right = w - 140.0;
        s.text(right, foot, &self.signatory_name, 16.0, true, INK, TextAlign::Right);
        s.line(right - 240.0, foot + 26.0, right, foot + 26.0, 1.0, GREY);
        s.text(right, foot + 34.0, &self.signatory_title, 13.0, false, GREY, TextAlign::Right);

        s.text(
            cx,
            h - 80.0,
            format!("Certificate No. {}", self.certificate_id),
            12.0,
            false,
            GREY,
            TextAlign::Center,
        );
    }
}

/// One scheduled part of a fee.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Installment {
    pub label: String,
    pub amount: i64,
    #[serde(default)]
    pub due_on: Option<NaiveDate>,
    #[serde(default)]
    pub paid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeReceipt {
    pub receipt_no: String,
    pub student_id: String,
    pub student_name: String,
    pub course: String,
    pub institute: String,
    pub paid_on: NaiveDate,
    /// Amount collected by this receipt.
    pub amount_paid: i64,
    pub payment_mode: String,
    pub total_fee: i64,
    #[serde(default)]
    pub installments: Vec<Installment>,
    #[serde(default)]
    pub currency: CurrencyFormat,
}

impl FeeReceipt {
    /// Sum of installments marked paid.
    pub fn total_paid(&self) -> i64 {
        self.installments
            .iter()
            .filter(|i| i.paid)
            .map(|i| i.amount)
            .sum()
    }

    /// Outstanding amount, never negative.
    pub fn balance(&self) -> i64 {
        (self.total_fee - self.total_paid()).max(0)
    }
}

impl SnapshotView for FeeReceipt {
    fn kind(&self) -> DocumentKind {
        DocumentKind::FeeReceipt
    }

    fn external_id(&self) -> &str {
        &self.receipt_no
    }

    fn person_name(&self) -> &str {
        &self.student_name
    }

    fn size_px(&self) -> (u32, u32) {
        FEE_RECEIPT_SIZE
    }

    fn paint(&self, s: &mut Scene) {
        let (w, h) = (FEE_RECEIPT_SIZE.0 as f32, FEE_RECEIPT_SIZE.1 as f32);
        let margin = 40.0;
        let money = |v: i64| format_currency(v, &self.currency);

        s.rect(0.0, 0.0, w, 80.0, NAVY);
        s.text(margin, 18.0, &self.institute, 20.0, true, PAPER, TextAlign::Left);
        s.text(margin, 48.0, "FEE RECEIPT", 12.0, false, PAPER, TextAlign::Left);
        s.text(
            w - margin,
            22.0,
            format!("No. {}", self.receipt_no),
            12.0,
            true,
            PAPER,
            TextAlign::Right,
        );
        s.text(w - margin, 46.0, date(self.paid_on), 12.0, false, PAPER, TextAlign::Right);

        let info = [
            ("Student", self.student_name.clone()),
            ("Student ID", self.student_id.clone()),
            ("Course", self.course.clone()),
            ("Payment Mode", self.payment_mode.clone()),
        ];
        for (i, (label, value)) in info.iter().enumerate() {
            let y = 100.0 + i as f32 * 22.0;
            s.text(margin, y, *label, 11.0, true, GREY, TextAlign::Left);
            s.text(margin + 130.0, y, value.clone(), 11.0, false, INK, TextAlign::Left);
        }

        // Installment schedule
        let mut y = 200.0;
        s.rect(margin, y, w - 2.0 * margin, 24.0, MIST);
        s.text(margin + 10.0, y + 6.0, "Installment", 10.0, true, INK, TextAlign::Left);
        s.text(margin + 300.0, y + 6.0, "Due", 10.0, true, INK, TextAlign::Left);
        s.text(margin + 440.0, y + 6.0, "Status", 10.0, true, INK, TextAlign::Left);
        s.text(w - margin - 10.0, y + 6.0, "Amount", 10.0, true, INK, TextAlign::Right);
        y += 24.0;
        for item in &self.installments {
            s.text(margin + 10.0, y + 6.0, &item.label, 10.0, false, INK, TextAlign::Left);
            s.text(
                margin + 300.0,
                y + 6.0,
                item.due_on.map(date).unwrap_or_else(|| "-".to_string()),
                10.0,
                false,
                INK,
                TextAlign::Left,
            );
            s.text(
                margin + 440.0,
                y + 6.0,
                if item.paid { "Paid" } else { "Pending" },
                10.0,
                item.paid,
                if item.paid { NAVY } else { GREY },
                TextAlign::Left,
            );
            s.text(w - margin - 10.0, y + 6.0, money(item.amount), 10.0, false, INK, TextAlign::Right);
            y += 22.0;
            s.line(margin, y, w - margin, y, 0.5, MIST);
        }

        let totals = [
            ("Amount Received", money(self.amount_paid), true),
            ("Total Fee", money(self.total_fee), false),
            ("Paid to Date", money(self.total_paid()), false),
            ("Balance Due", money(self.balance()), true),
        ];
        let mut ty = (y + 20.0).max(330.0);
        for (label, value, bold) in totals {
            s.text(w - margin - 200.0, ty, label, 11.0, bold, INK, TextAlign::Right);
            s.text(w - margin - 10.0, ty, value, 11.0, bold, NAVY, TextAlign::Right);
            ty += 22.0;
        }

        s.line(margin, h - 50.0, margin + 180.0, h - 50.0, 1.0, GREY);
        s.text(margin, h - 42.0, "Authorised Signatory", 10.0, false, GREY, TextAlign::Left);
        s.frame(0.0, 0.0, w, h, 1.0, GREY);
    }
}
