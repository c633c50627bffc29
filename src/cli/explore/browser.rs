use std::io::{self, Write};

use color_print::cformat;
use crossterm::style::{Color, Stylize};

use super::city::CityRecord;

/// Card accent colours, cycled by position.
const PALETTE: [Color; 10] = [
    Color::Rgb { r: 59, g: 130, b: 246 },
    Color::Rgb { r: 34, g: 197, b: 94 },
    Color::Rgb { r: 249, g: 115, b: 22 },
    Color::Rgb { r: 168, g: 85, b: 247 },
    Color::Rgb { r: 234, g: 179, b: 8 },
    Color::Rgb { r: 99, g: 102, b: 241 },
    Color::Rgb { r: 236, g: 72, b: 153 },
    Color::Rgb { r: 20, g: 184, b: 166 },
    Color::Rgb { r: 239, g: 68, b: 68 },
    Color::Rgb { r: 6, g: 182, b: 212 },
];

const HISTORY_PREVIEW_LINES: usize = 3;

pub fn city_color(index: usize) -> Color {
    PALETTE[index % PALETTE.len()]
}

/// Read-only view over one result set with a search filter and an optional
/// detail view.
pub struct ResultBrowser {
    records: Vec<CityRecord>,
    region: String,
    search_term: String,
    selected: Option<usize>,
}

impl ResultBrowser {
    pub fn new(records: Vec<CityRecord>, region: impl Into<String>) -> Self {
        Self {
            records,
            region: region.into(),
            search_term: String::new(),
            selected: None,
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    #[cfg(test)]
    pub fn records(&self) -> &[CityRecord] {
        &self.records
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    pub fn clear_search(&mut self) {
        self.search_term.clear();
    }

    /// Records matching the search term, paired with their position in the
    /// full result set.
    pub fn filtered(&self) -> Vec<(usize, &CityRecord)> {
        let needle = self.search_term.to_lowercase();
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.matches(&needle))
            .collect()
    }

    #[cfg(test)]
    pub fn has_no_results(&self) -> bool {
        self.filtered().is_empty()
    }

    /// Open the detail view for a card, addressed by its 1-based number in
    /// the current grid or by city name.
    pub fn select(&mut self, key: &str) -> Option<&CityRecord> {
        let key = key.trim();
        let visible = self.filtered();

        let index = match key.parse::<usize>() {
            Ok(n) if n >= 1 => visible.get(n - 1).map(|(i, _)| *i),
            Ok(_) => None,
            Err(_) => {
                let name = key.to_lowercase();
                visible
                    .iter()
                    .find(|(_, record)| record.city.to_lowercase() == name)
                    .map(|(i, _)| *i)
            }
        }?;

        self.selected = Some(index);
        self.records.get(index)
    }

    pub fn selected(&self) -> Option<&CityRecord> {
        self.selected.and_then(|i| self.records.get(i))
    }

    /// Back to the grid; the search term is kept.
    pub fn close_detail(&mut self) {
        self.selected = None;
    }

    /// Draw the detail view if a card is open, otherwise the grid.
    pub fn render(&self, out: &mut dyn Write, width: usize) -> io::Result<()> {
        match self.selected {
            Some(index) => self.render_detail(out, index, width),
            None => self.render_grid(out, width),
        }
    }

    pub fn render_header(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "{}", cformat!("<bold>Explore {}</>", self.region))?;
        writeln!(
            out,
            "{}",
            cformat!(
                "<dim>Discover the rich heritage, culture, and beauty of {}'s magnificent cities</>",
                self.region
            )
        )?;
        if !self.search_term.is_empty() {
            writeln!(out, "{}", cformat!("<dim>Search:</> {}", self.search_term))?;
        }
        Ok(())
    }

    pub fn render_grid(&self, out: &mut dyn Write, width: usize) -> io::Result<()> {
        self.render_header(out)?;
        let visible = self.filtered();

        if visible.is_empty() {
            writeln!(out)?;
            writeln!(out, "{}", cformat!("<bold>No cities found</>"))?;
            writeln!(out, "{}", cformat!("<dim>Try adjusting your search terms</>"))?;
            return Ok(());
        }

        for (position, (_, record)) in visible.iter().enumerate() {
            let color = city_color(position);
            writeln!(out)?;
            writeln!(
                out,
                "{} {}",
                format!(" {} ", position + 1).on(color).white().bold(),
                record.city.as_str().with(color).bold()
            )?;
            write_wrapped(out, &record.description, width, "  ")?;
            writeln!(out, "  {}", "★ Famous For".bold())?;
            write_wrapped(out, &record.famous_for, width, "    ")?;
            writeln!(out, "  {}", "⏱ History".bold())?;

            let mut history = wrap(&record.history, width.saturating_sub(4));
            if history.len() > HISTORY_PREVIEW_LINES {
                history.truncate(HISTORY_PREVIEW_LINES);
                if let Some(last) = history.last_mut() {
                    last.push('…');
                }
            }
            for line in history {
                writeln!(out, "    {}", line)?;
            }
        }

        writeln!(out)?;
        writeln!(
            out,
            "{}",
            cformat!("<dim>{} of {} cities. /show <<n|name> for details.</>", visible.len(), self.records.len())
        )?;
        Ok(())
    }

    fn render_detail(&self, out: &mut dyn Write, index: usize, width: usize) -> io::Result<()> {
        let Some(record) = self.records.get(index) else {
            return self.render_grid(out, width);
        };
        let color = city_color(index);

        writeln!(out)?;
        writeln!(out, "{}", format!("  {}  ", record.city).on(color).white().bold())?;
        writeln!(out)?;
        writeln!(out, "{}", "About".bold())?;
        write_wrapped(out, &record.description, width, "  ")?;
        writeln!(out)?;
        writeln!(out, "{}", "⏱ Historical Background".bold())?;
        write_wrapped(out, &record.history, width, "  ")?;
        writeln!(out)?;
        writeln!(out, "{}", "★ What It's Famous For".bold())?;
        write_wrapped(out, &record.famous_for, width, "  ")?;
        writeln!(out)?;
        writeln!(out, "{}", cformat!("<dim>/close to return to the list</>"))?;
        Ok(())
    }
}

fn write_wrapped(out: &mut dyn Write, text: &str, width: usize, indent: &str) -> io::Result<()> {
    for line in wrap(text, width.saturating_sub(indent.chars().count())) {
        writeln!(out, "{}{}", indent, line)?;
    }
    Ok(())
}

/// Greedy word wrap. Words longer than `width` get a line of their own.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(20);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
