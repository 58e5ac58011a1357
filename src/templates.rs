//! Offer letter – request record, default terms and the three-part
//! composition (letter, compensation, terms).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::composer::{Align, PageComposer, TextStyle, MUTED, PRIMARY};
use crate::config::{ComposerConfig, InstituteProfile};
use crate::error::Result;
use crate::fonts::FontManager;
use crate::layout_config::LayoutConfig;
use crate::money::{format_currency, SalaryComponents};
use crate::pagination::FlowReport;

/// Input for one offer letter. Fields are validated upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferLetterRequest {
    /// Staff record the letter belongs to; names the stored artifact.
    pub record_id: String,
    pub name: String,
    pub father_name: String,
    pub position: String,
    pub department: String,
    pub work_location: String,
    pub employment_type: String,
    pub joining_date: NaiveDate,
    pub probation_period: String,
    pub working_hours: String,
    pub salary: SalaryComponents,
    /// Letter date; today when absent.
    #[serde(default)]
    pub offer_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Replaces [`default_terms`] when present.
    #[serde(default)]
    pub terms: Option<Vec<TermsSection>>,
}

/// One numbered terms-and-conditions section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermsSection {
    pub heading: String,
    pub paragraphs: Vec<String>,
}

impl TermsSection {
    pub fn new(heading: &str, paragraphs: &[&str]) -> Self {
        Self {
            heading: heading.to_string(),
            paragraphs: paragraphs.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Layout plus what happened to the variable-length terms.
#[derive(Debug, Clone)]
pub struct ComposedDocument {
    pub layout: LayoutConfig,
    pub report: FlowReport,
}

/// Standard terms printed when the request carries none.
pub fn default_terms() -> Vec<TermsSection> {
    vec![
        TermsSection::new(
            "Probation",
            &["You will be on probation for the period stated above. During probation \
               either party may end the employment with seven days written notice. \
               Confirmation is subject to satisfactory performance and conduct."],
        ),
        TermsSection::new(
            "Working Hours and Attendance",
            &["You are expected to observe the working hours stated above and to be \
               present for scheduled classes, examinations, parent meetings and institute \
               events. Leave must be applied for in advance through the staff portal."],
        ),
        TermsSection::new(
            "Salary and Deductions",
            &["Salary is paid monthly by bank transfer on or before the seventh working \
               day of the following month. Statutory deductions and any advances taken \
               are recovered from the monthly salary."],
        ),
        TermsSection::new(
            "Confidentiality",
            &["You shall keep confidential all student records, examination papers, fee \
               details and internal communications, both during and after your \
               employment, and shall not share them with any third party."],
        ),
        TermsSection::new(
            "Conduct",
            &["You shall conduct yourself professionally with students, parents and \
               colleagues and follow the code of conduct published by the institute. \
               Private tuition of enrolled students is not permitted."],
        ),
        TermsSection::new(
            "Notice Period",
            &["After confirmation either party may terminate the employment by giving \
               thirty days written notice or salary in lieu of notice. Notice should \
               not fall within an examination period without prior approval."],
        ),
        TermsSection::new(
            "Acceptance",
            &["Please sign and return a copy of this letter as acceptance of the offer. \
               This offer lapses if not accepted within seven days of the date above."],
        ),
    ]
}

fn long_date(date: NaiveDate) -> String {
    date.format("%d %B %Y").to_string()
}

/// Compose an offer letter with default font metrics.
pub fn compose_offer_letter(
    request: &OfferLetterRequest,
    config: &ComposerConfig,
    profile: &InstituteProfile,
) -> Result<ComposedDocument> {
    compose_offer_letter_with(request, config, profile, FontManager::default())
}

/// Compose an offer letter measuring text with `fonts`.
pub fn compose_offer_letter_with(
    request: &OfferLetterRequest,
    config: &ComposerConfig,
    profile: &InstituteProfile,
    fonts: FontManager,
) -> Result<ComposedDocument> {
    let mut composer = PageComposer::new(config, profile)?.with_fonts(fonts);
    let size = config.body_font_size;
    let lh = config.line_height;
    let currency = &config.currency;

    // Page 1: letter and employment summary.
    let mut cursor = composer.new_page()?;
    let date = request
        .offer_date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    composer.write_line(&mut cursor, &format!("Date: {}", long_date(date)), TextStyle::body(size), lh)?;
    let right_x = composer.left();
    composer.draw_text_aligned(
        &cursor,
        right_x,
        config.content_width(),
        Align::Right,
        &format!("Ref: OL/{}", request.record_id),
        TextStyle::body(size).colored(MUTED),
    );
    cursor.skip(lh);
    composer.write_line(&mut cursor, "To,", TextStyle::body(size), lh)?;
    composer.write_line(&mut cursor, &request.name, TextStyle::bold(size), lh)?;
    composer.write_line(
        &mut cursor,
        &format!("S/o / D/o {}", request.father_name),
        TextStyle::body(size),
        lh,
    )?;
    cursor.skip(lh);
    composer.write_line(
        &mut cursor,
        &format!("Subject: Offer of Employment - {}", request.position),
        TextStyle::bold(size + 1.0),
        lh,
    )?;
    cursor.skip(lh * 0.5);
    composer.write_line(&mut cursor, &format!("Dear {},", request.name), TextStyle::body(size), lh)?;
    cursor.skip(lh * 0.3);

    let opening = vec![format!(
        "We are pleased to offer you the position of {} in the {} department at {}. \
         Your employment will commence on {} at our {} location as a {} employee, \
         subject to the terms and conditions set out in this letter.",
        request.position,
        request.department,
        profile.name,
        long_date(request.joining_date),
        request.work_location,
        request.employment_type.to_lowercase(),
    )];
    let mut report = composer.draw_paragraphs(&mut cursor, &opening)?;
    cursor.skip(lh * 0.5);

    let details = [
        ("Position", request.position.clone()),
        ("Department", request.department.clone()),
        ("Work Location", request.work_location.clone()),
        ("Employment Type", request.employment_type.clone()),
        ("Joining Date", long_date(request.joining_date)),
        ("Probation Period", request.probation_period.clone()),
        ("Working Hours", request.working_hours.clone()),
    ];
    composer.draw_key_value_block(&mut cursor, "Employment Details", &details)?;

    if let Some(notes) = request.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        cursor.skip(lh);
        let notes = split_paragraphs(notes);
        report.merge(&composer.draw_paragraphs(&mut cursor, &notes)?);
    }

    // Page 2: compensation.
    let mut cursor = composer.new_page()?;
    composer.write_line(
        &mut cursor,
        "Compensation Structure",
        TextStyle::bold(13.0).colored(PRIMARY),
        lh * 1.4,
    )?;
    cursor.skip(lh * 0.3);
    let intro = vec![format!(
        "Your monthly and annual compensation as {} is set out below.",
        request.position
    )];
    report.merge(&composer.draw_paragraphs(&mut cursor, &intro)?);

    let salary = &request.salary;
    let rows: Vec<Vec<String>> = salary
        .rows()
        .iter()
        .map(|(label, monthly)| {
            vec![
                label.to_string(),
                format_currency(*monthly, currency),
                format_currency(monthly * 12, currency),
            ]
        })
        .collect();
    let totals = vec![
        "Gross Salary".to_string(),
        format_currency(salary.gross(), currency),
        format_currency(salary.annual(), currency),
    ];
    composer.draw_table(&mut cursor, &["Component", "Monthly", "Annual"], &rows, Some(&totals))?;
    cursor.skip(lh);
    composer.write_line(
        &mut cursor,
        &format!("Annual Cost to Institute: {}", format_currency(salary.annual(), currency)),
        TextStyle::bold(size + 1.0),
        lh,
    )?;
    cursor.skip(lh * 0.5);
    let note = vec![
        "All amounts are gross and subject to applicable statutory deductions. Salary \
         revisions, if any, are made at the annual appraisal."
            .to_string(),
    ];
    report.merge(&composer.draw_paragraphs(&mut cursor, &note)?);

    // Page 3: terms and signatures.
    let mut cursor = composer.new_page()?;
    composer.write_line(
        &mut cursor,
        "Terms and Conditions",
        TextStyle::bold(13.0).colored(PRIMARY),
        lh * 1.4,
    )?;
    let terms = request.terms.clone().unwrap_or_else(default_terms);
    for (i, section) in terms.iter().enumerate() {
        let heading = format!("{}. {}", i + 1, section.heading);
        report.merge(&composer.draw_section(&mut cursor, &heading, &section.paragraphs)?);
    }

    draw_signatures(&mut composer, &mut cursor, request, profile)?;

    let (mut layout, _) = composer.finish();
    layout.title = format!("Offer Letter - {}", request.name);
    Ok(ComposedDocument { layout, report })
}

fn split_paragraphs(notes: &str) -> Vec<String> {
    notes
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn draw_signatures(
    composer: &mut PageComposer<'_>,
    cursor: &mut crate::pagination::PageCursor,
    request: &OfferLetterRequest,
    profile: &InstituteProfile,
) -> Result<()> {
    let config = composer.config().clone();
    let lh = config.line_height;
    let size = config.body_font_size;
    let left = composer.left();
    let half = config.content_width() / 2.0;

    composer.ensure_space(cursor, lh * 8.0)?;
    cursor.skip(lh * 1.5);
    cursor.advance(lh);
    composer.draw_text(cursor, left, &format!("For {}", profile.name), TextStyle::bold(size));
    composer.draw_text(cursor, left + half, "Accepted by", TextStyle::bold(size));

    cursor.advance(lh * 3.0);
    let rule = crate::layout_config::Stroke {
        width: 0.5,
        color: MUTED,
    };
    composer.draw_line(cursor, left, left + half - 30.0, rule);
    composer.draw_line(cursor, left + half, left + 2.0 * half, rule);

    cursor.advance(lh);
    composer.draw_text(cursor, left, &profile.signatory_name, TextStyle::bold(size));
    composer.draw_text(cursor, left + half, &request.name, TextStyle::bold(size));
    cursor.advance(lh);
    composer.draw_text(
        cursor,
        left,
        &profile.signatory_title,
        TextStyle::body(size).colored(MUTED),
    );
    composer.draw_text(
        cursor,
        left + half,
        "Signature and date",
        TextStyle::body(size).colored(MUTED),
    );
    Ok(())
}
