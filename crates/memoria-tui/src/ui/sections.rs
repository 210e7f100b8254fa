//! Content area for each dashboard section.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use memoria_core::models::{
    format_cents, DashboardSummary, Memorial, MemorialEvent, Order, Product, Profile, SectionData,
    Subscription,
};

use super::styles;
use crate::app::App;
use crate::view::SectionView;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let section = app.current_section();
    let title = format!(" {} ", section.title());

    match app.navigator.renderer().visible_view() {
        SectionView::Empty => {
            let paragraph = Paragraph::new(Line::from(Span::styled(
                "Nothing loaded yet. Press [u] to load.",
                styles::muted_style(),
            )))
            .block(block(&title));
            frame.render_widget(paragraph, area);
        }
        SectionView::Loading { stale: Some(data) } => {
            render_data(frame, app, area, &format!("{}(refreshing...) ", title), data);
        }
        SectionView::Loading { stale: None } => {
            let paragraph = Paragraph::new(Line::from(Span::styled(
                "Loading...",
                styles::highlight_style(),
            )))
            .block(block(&title));
            frame.render_widget(paragraph, area);
        }
        SectionView::Ready(data) => render_data(frame, app, area, &title, data),
        SectionView::Failed { message, .. } => {
            let lines = vec![
                Line::from(Span::styled(message.clone(), styles::error_style())),
                Line::from(""),
                Line::from(vec![
                    Span::styled("[Enter]", styles::help_key_style()),
                    Span::styled(" Retry", styles::help_desc_style()),
                ]),
            ];
            let paragraph = Paragraph::new(lines)
                .block(block(&title))
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
        }
    }
}

fn block(title: &str) -> Block<'_> {
    Block::default()
        .title(Span::styled(title, styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
}

fn render_data(frame: &mut Frame, app: &App, area: Rect, title: &str, data: &SectionData) {
    match data {
        SectionData::Summary(summary) => render_summary(frame, area, title, summary),
        SectionData::Profile(profile) => render_profile(frame, area, title, profile),
        SectionData::Memorials(items) => {
            render_list(frame, app, area, title, items.iter().map(memorial_item).collect())
        }
        SectionData::Events(items) => {
            render_list(frame, app, area, title, items.iter().map(event_item).collect())
        }
        SectionData::Products(items) => {
            render_list(frame, app, area, title, items.iter().map(product_item).collect())
        }
        SectionData::Orders(items) => {
            render_list(frame, app, area, title, items.iter().map(order_item).collect())
        }
        SectionData::Subscriptions(items) => render_list(
            frame,
            app,
            area,
            title,
            items.iter().map(subscription_item).collect(),
        ),
    }
}

fn render_list(frame: &mut Frame, app: &App, area: Rect, title: &str, items: Vec<ListItem<'static>>) {
    if items.is_empty() {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            "No entries.",
            styles::muted_style(),
        )))
        .block(block(title));
        frame.render_widget(paragraph, area);
        return;
    }

    let mut state = ListState::default();
    state.select(Some(app.selection().min(items.len() - 1)));

    let list = List::new(items)
        .block(block(title))
        .style(styles::list_item_style())
        .highlight_style(styles::selected_style())
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, area, &mut state);
}

fn field<'a>(label: &'a str, value: String) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("  {:<22}", label), styles::muted_style()),
        Span::styled(value, styles::list_item_style()),
    ])
}

fn render_summary(frame: &mut Frame, area: Rect, title: &str, summary: &DashboardSummary) {
    let lines = vec![
        Line::from(""),
        field("Memorials", summary.memorial_count.to_string()),
        field("Upcoming events", summary.upcoming_events.to_string()),
        field("Open orders", summary.open_orders.to_string()),
        field("Active subscriptions", summary.active_subscriptions.to_string()),
        field("Candles lit", summary.candles_lit.to_string()),
    ];
    frame.render_widget(Paragraph::new(lines).block(block(title)), area);
}

fn render_profile(frame: &mut Frame, area: Rect, title: &str, profile: &Profile) {
    let lines = vec![
        Line::from(""),
        field("Name", profile.name.clone()),
        field("Email", profile.email.clone()),
        field("Phone", profile.phone.clone().unwrap_or_else(|| "-".to_string())),
        field(
            "Member since",
            profile
                .created_at
                .as_deref()
                .map(short_date)
                .unwrap_or_else(|| "-".to_string()),
        ),
    ];
    frame.render_widget(Paragraph::new(lines).block(block(title)), area);
}

/// First ten characters of an ISO timestamp (the date part).
fn short_date(s: &str) -> String {
    s.get(..10).unwrap_or(s).to_string()
}

fn memorial_item(m: &Memorial) -> ListItem<'static> {
    let mut spans = vec![
        Span::raw(format!("{:<32}", m.full_name)),
        Span::styled(format!("{:<14}", m.life_span()), styles::muted_style()),
    ];
    if m.is_published {
        spans.push(Span::styled("published", styles::success_style()));
    } else {
        spans.push(Span::styled("draft", styles::highlight_style()));
    }
    if m.candle_count > 0 {
        spans.push(Span::styled(
            format!("  {} candles", m.candle_count),
            styles::muted_style(),
        ));
    }
    ListItem::new(Line::from(spans))
}

fn event_item(e: &MemorialEvent) -> ListItem<'static> {
    let when = e.starts_at.as_deref().map(short_date).unwrap_or_default();
    let mut spans = vec![
        Span::styled(format!("{:<12}", when), styles::highlight_style()),
        Span::raw(format!("{:<32}", e.title)),
        Span::styled(e.location.clone().unwrap_or_default(), styles::muted_style()),
    ];
    if e.is_livestreamed {
        spans.push(Span::styled("  [live]", styles::success_style()));
    }
    ListItem::new(Line::from(spans))
}

fn product_item(p: &Product) -> ListItem<'static> {
    let mut spans = vec![
        Span::raw(format!("{:<32}", p.name)),
        Span::styled(format!("{:>10}  ", format_cents(p.price_cents)), styles::highlight_style()),
        Span::styled(p.category.clone().unwrap_or_default(), styles::muted_style()),
    ];
    if !p.in_stock {
        spans.push(Span::styled("  out of stock", styles::error_style()));
    }
    ListItem::new(Line::from(spans))
}

fn order_item(o: &Order) -> ListItem<'static> {
    let status_style = if o.status.is_open() {
        styles::highlight_style()
    } else {
        styles::muted_style()
    };
    ListItem::new(Line::from(vec![
        Span::raw(format!("#{:<8}", o.id)),
        Span::styled(format!("{:<11}", o.status.to_string()), status_style),
        Span::raw(format!("{:>10}  ", format_cents(o.total_cents))),
        Span::styled(
            format!(
                "{} items  {}",
                o.item_count(),
                o.placed_at.as_deref().map(short_date).unwrap_or_default()
            ),
            styles::muted_style(),
        ),
    ]))
}

fn subscription_item(s: &Subscription) -> ListItem<'static> {
    let status_style = if s.is_active() {
        styles::success_style()
    } else {
        styles::muted_style()
    };
    let renews = s
        .renews_at
        .as_deref()
        .map(|d| format!("renews {}", short_date(d)))
        .unwrap_or_default();
    ListItem::new(Line::from(vec![
        Span::raw(format!("{:<24}", s.plan)),
        Span::styled(format!("{:<12}", s.status), status_style),
        Span::styled(renews, styles::muted_style()),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_date() {
        assert_eq!(short_date("2024-05-01T10:00:00Z"), "2024-05-01");
        assert_eq!(short_date("2024"), "2024");
    }
}
