use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::{
    tui::{app::App, ui::centered_rect},
    utils::{format_amount, format_timestamp},
};

pub fn render(frame: &mut Frame, app: &App) {
    let Some(details) = app.details.as_ref() else {
        return;
    };
    let theme = &app.theme;
    let application = &details.application;

    let field = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{:22}", label), Style::default().fg(theme.warning)),
            Span::styled(value, Style::default().fg(theme.foreground)),
        ])
    };
    let section = |title: &str| {
        Line::from(Span::styled(
            title.to_string(),
            theme.title().add_modifier(Modifier::UNDERLINED),
        ))
    };

    let applied = &application.amount_applied_for;
    let mut lines = vec![
        section("Applicant"),
        field("Name", application.applicant_full_name.clone()),
        field("Phone", application.applicant_phone_number.clone()),
        field("Email", application.applicant_email.clone()),
        field("National ID", application.national_identification_number.clone()),
        field("County", application.county.clone()),
        field("Disability", application.any_form_of_disability.clone()),
        Line::default(),
        section("Academics"),
        field("Admission", application.admission_number.clone()),
        field("School", application.school_name.clone()),
        field("Department", application.department_name.clone()),
        field("Course", application.enrolled_course.clone()),
        field("Year of study", application.year_of_study.clone()),
        field("Previous grade", application.previous_academic_year_grade.clone()),
        field("Sponsorship", application.sponsorship_type.clone()),
        Line::default(),
        section("Decision"),
        Line::from(vec![
            Span::styled(format!("{:22}", "Status"), Style::default().fg(theme.warning)),
            Span::styled(
                details.status.as_str(),
                Style::default()
                    .fg(theme.status(details.status))
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        field(
            "Amount applied",
            format!("{} {}", applied.currency, format_amount(applied.amount)),
        ),
        field(
            "Amount allocated",
            format!(
                "{} {}",
                details.allocation.currency,
                format_amount(details.allocation.amount)
            ),
        ),
        field("Batch", details.batch_label.clone()),
        field("Remark", details.remark.clone()),
    ];
    if let Some(approver) = &details.approver {
        lines.push(field("Approved by", approver.clone()));
    }
    if let Some(date) = &details.approved_date {
        lines.push(field("Decided on", format_timestamp(date)));
    }
    if app.identity.is_staff() {
        lines.push(Line::default());
        lines.push(Line::from(vec![
            Span::styled("d", theme.key()),
            Span::raw(" decide  "),
            Span::styled("Esc", theme.key()),
            Span::raw(" close"),
        ]));
    }

    let height = (lines.len() as u16).saturating_add(2);
    let area = centered_rect(70, height, frame.size());
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(format!(" Application {} ", application.id), theme.title()))
        .border_style(Style::default().fg(theme.primary));

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}
