pub mod browser;
pub mod city;
pub mod conversation_state;
pub mod form;
pub mod location;
pub mod prompt;
pub mod seed;

use std::io::Write;
use std::process::ExitCode;

use browser::ResultBrowser;
use color_print::cformat;
use eyre::Result;
use form::{Field, FormController, SubmitError, validate};
use location::{
    AddressLookup, FixedPosition, GeoLocator, IpPosition, Position, PositionSource, ReverseGeocoder,
    parse_coordinates,
};
use prompt::{SEARCH_PROMPT, field_prompt};
use rustyline::error::ReadlineError;
use tracing::{debug, warn};

use crate::config::LocationConfig;
use crate::gemini_client::GenerativeBackend;

const WELCOME_TEXT: &str = "
Hi, I'm City Explorer. Tell me a state and a country and I'll list its cities.

/locate       Fill in the form from your location
/help         Show the help dialogue
/quit         Quit the application
";

const FORM_HELP_TEXT: &str = "
Location form

Type a value and press Enter. Existing values are pre-filled; press Enter to keep them.

/reset             Clear both fields and all errors
/locate [LAT,LON]  Fill in the form from your location or from coordinates
/forget            Start a fresh conversation with the model
/help              Show this help dialogue
/quit              Quit the application
";

const RESULTS_HELP_TEXT: &str = "
City browser

<text>             Search names, descriptions and famous-for text, exactly as typed
//<text>           Search for text that starts with a slash
/clear             Clear the search
/show <n|name>     Show details for one city
/close             Close the details view
/back              Go back to the form
/help              Show this help dialogue
/quit              Quit the application

Lines starting with / are commands. Case is ignored when matching.
";

const MAX_WIDTH: usize = 100;

#[derive(Debug, PartialEq, Eq)]
pub enum FormAction {
    Continue,
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ResultsAction {
    Stay,
    Back,
    Quit,
}

pub struct ExploreContext<B> {
    output: Box<dyn Write>,
    form: FormController<B>,
    location: LocationConfig,
}

impl<B: GenerativeBackend> ExploreContext<B> {
    pub fn new(output: Box<dyn Write>, form: FormController<B>, location: LocationConfig) -> Self {
        Self {
            output,
            form,
            location,
        }
    }

    pub fn form(&self) -> &FormController<B> {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormController<B> {
        &mut self.form
    }

    /// Interactive session: form view, then results view, until `/quit`.
    pub async fn run(&mut self, at: Option<Position>) -> Result<ExitCode> {
        writeln!(self.output, "{}", WELCOME_TEXT)?;

        if let Some(position) = at {
            let locator = self.locator(Some(position))?;
            self.apply_lookup(&locator).await?;
        }

        let mut rl = prompt::rl()?;

        loop {
            let Some(mut browser) = self.run_form(&mut rl).await? else {
                break;
            };

            browser.render(&mut self.output, terminal_width())?;
            if self.run_results(&mut rl, &mut browser)? == ResultsAction::Quit {
                break;
            }
            // Dropping the browser discards its search term and selection.
        }

        Ok(ExitCode::SUCCESS)
    }

    /// Submit one query and print the (optionally filtered) grid.
    ///
    /// Returns whether the query produced results.
    pub async fn run_once(&mut self, state: &str, country: &str, search: Option<&str>) -> Result<bool> {
        self.form.set_field(Field::StateName, state);
        self.form.set_field(Field::CountryName, country);

        let Some(mut browser) = self.submit_form().await? else {
            return Ok(false);
        };

        if let Some(term) = search {
            browser.set_search_term(term);
        }
        browser.render(&mut self.output, terminal_width())?;
        Ok(true)
    }

    /// Detect the address once and print it.
    pub async fn locate_once(&mut self, at: Option<Position>) -> Result<bool> {
        let locator = self.locator(at)?;
        self.apply_lookup(&locator).await
    }

    async fn run_form(&mut self, rl: &mut rustyline::Editor<()>) -> Result<Option<ResultBrowser>> {
        let mut field = self.form.focus();

        loop {
            let initial = self.form.query().get(field).to_string();
            let line = match rl.readline_with_initial(&field_prompt(field), (initial.as_str(), "")) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => return Ok(None),
                Err(e) => return Err(e.into()),
            };

            let trimmed = line.trim();
            if trimmed.starts_with('/') {
                rl.add_history_entry(trimmed);
                if self.handle_form_command(trimmed).await? == FormAction::Quit {
                    return Ok(None);
                }
                field = self.form.focus();
                continue;
            }

            self.form.set_field(field, line.as_str());
            if field == Field::StateName {
                field = Field::CountryName;
                continue;
            }

            if let Some(browser) = self.submit_form().await? {
                return Ok(Some(browser));
            }
            field = self.form.focus();
        }
    }

    /// Submit the form and report every failure inline.
    ///
    /// Returns a browser over the results, or `None` when the form stays open.
    pub async fn submit_form(&mut self) -> Result<Option<ResultBrowser>> {
        if validate(self.form.query()).valid {
            let query = self.form.query();
            writeln!(
                self.output,
                "{}",
                cformat!(
                    "<dim>Fetching cities in {}, {}…</>",
                    query.state_name.trim(),
                    query.country_name.trim()
                )
            )?;
            self.output.flush()?;
        }

        match self.form.submit().await {
            Ok(records) => {
                let region = self.form.query().state_name.trim().to_string();
                Ok(Some(ResultBrowser::new(records, region)))
            }
            Err(SubmitError::Validation(errors)) => {
                for message in errors.values() {
                    writeln!(self.output, "  {}", cformat!("<red>✗ {}</>", message))?;
                }
                Ok(None)
            }
            Err(e) => {
                writeln!(self.output, "{}", cformat!("<red>Error: {}</>", e))?;
                self.form.set_focus(Field::StateName);
                Ok(None)
            }
        }
    }

    pub async fn handle_form_command(&mut self, command: &str) -> Result<FormAction> {
        let (name, arg) = split_command(command);

        match name {
            "/quit" => return Ok(FormAction::Quit),
            "/help" => writeln!(self.output, "{}", FORM_HELP_TEXT)?,
            "/reset" => {
                self.form.reset();
                writeln!(self.output, "Form cleared.")?;
            }
            "/forget" => {
                self.form.session_mut().reset();
                writeln!(self.output, "Conversation reset.")?;
            }
            "/locate" => {
                let at = match arg {
                    Some(raw) => match parse_coordinates(raw) {
                        Ok(position) => Some(position),
                        Err(_) => {
                            writeln!(
                                self.output,
                                "{}",
                                cformat!("<red>Coordinates must look like LAT,LON (for example 19.07,72.88)</>")
                            )?;
                            return Ok(FormAction::Continue);
                        }
                    },
                    None => None,
                };
                let locator = self.locator(at)?;
                self.apply_lookup(&locator).await?;
            }
            _ => writeln!(self.output, "Unknown command: {}. Type /help for options.", name)?,
        }

        Ok(FormAction::Continue)
    }

    fn locator(&self, at: Option<Position>) -> Result<GeoLocator> {
        let position: Box<dyn PositionSource> = match at {
            Some(position) => Box::new(FixedPosition(position)),
            None => Box::new(IpPosition::new(self.location.position_url.clone(), self.location.timeout)?),
        };
        let geocoder = ReverseGeocoder::new(self.location.geocoder_url.clone(), self.location.timeout)?;
        Ok(GeoLocator::new(position, geocoder))
    }

    /// Pre-fill the form from `lookup`. Failures are shown and otherwise
    /// ignored; returns whether an address was applied.
    pub async fn apply_lookup(&mut self, lookup: &dyn AddressLookup) -> Result<bool> {
        writeln!(self.output, "{}", cformat!("<dim>Detecting your location…</>"))?;
        self.output.flush()?;

        match lookup.locate().await {
            Ok(address) => {
                self.form.apply_address(&address);
                writeln!(
                    self.output,
                    "{}",
                    cformat!("<green>Location detected:</> {}, {}", address.state, address.country)
                )?;
                Ok(true)
            }
            Err(e) => {
                writeln!(self.output, "{}", cformat!("<red>{}</>", e))?;
                Ok(false)
            }
        }
    }

    fn run_results(
        &mut self,
        rl: &mut rustyline::Editor<()>,
        browser: &mut ResultBrowser,
    ) -> Result<ResultsAction> {
        loop {
            let line = match rl.readline(SEARCH_PROMPT) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => return Ok(ResultsAction::Quit),
                Err(e) => return Err(e.into()),
            };

            if !line.trim().is_empty() {
                rl.add_history_entry(line.as_str());
            }

            match self.handle_results_input(browser, &line)? {
                ResultsAction::Stay => {}
                action => return Ok(action),
            }
        }
    }

    pub fn handle_results_input(
        &mut self,
        browser: &mut ResultBrowser,
        input: &str,
    ) -> Result<ResultsAction> {
        let width = terminal_width();

        // `//x` searches for `/x`; any other line starting with `/` is a command.
        let term = match input.strip_prefix('/') {
            Some(rest) if rest.starts_with('/') => Some(rest),
            Some(_) => None,
            None => Some(input),
        };

        if let Some(term) = term {
            if !term.is_empty() {
                browser.set_search_term(term);
                browser.close_detail();
            }
            browser.render(&mut self.output, width)?;
            return Ok(ResultsAction::Stay);
        }

        let (name, arg) = split_command(input);
        match name {
            "/quit" => return Ok(ResultsAction::Quit),
            "/back" => {
                debug!(region = browser.region(), "Leaving results view");
                return Ok(ResultsAction::Back);
            }
            "/help" => writeln!(self.output, "{}", RESULTS_HELP_TEXT)?,
            "/clear" => {
                browser.clear_search();
                browser.close_detail();
                browser.render(&mut self.output, width)?;
            }
            "/close" => {
                browser.close_detail();
                browser.render(&mut self.output, width)?;
            }
            "/show" => match arg {
                Some(key) => {
                    if browser.select(key).is_some() {
                        browser.render(&mut self.output, width)?;
                    } else {
                        warn!("No city matches {:?}", key);
                        writeln!(self.output, "No city matches \"{}\" in the current list.", key)?;
                    }
                }
                None => writeln!(self.output, "Usage: /show <n|name>")?,
            },
            _ => writeln!(self.output, "Unknown command: {}. Type /help for options.", name)?,
        }

        Ok(ResultsAction::Stay)
    }
}

fn split_command(input: &str) -> (&str, Option<&str>) {
    match input.trim().split_once(char::is_whitespace) {
        Some((name, rest)) if !rest.trim().is_empty() => (name, Some(rest.trim())),
        Some((name, _)) => (name, None),
        None => (input.trim(), None),
    }
}

fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(columns, _)| columns as usize)
        .unwrap_or(80)
        .min(MAX_WIDTH)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::cli::explore::city::parse_city_records;
    use crate::cli::explore::conversation_state::PromptSession;
    use crate::cli::explore::conversation_state::tests::ScriptedBackend;
    use crate::cli::explore::location::{Address, LocationError};
    use crate::cli::explore::seed::SEED_CITIES_JSON;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct StubLookup(Result<Address, LocationError>);

    #[async_trait]
    impl AddressLookup for StubLookup {
        async fn locate(&self) -> Result<Address, LocationError> {
            self.0.clone()
        }
    }

    fn context(backend: ScriptedBackend) -> (ExploreContext<ScriptedBackend>, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let location = LocationConfig {
            position_url: "http://127.0.0.1:9/".to_string(),
            geocoder_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_millis(50),
        };
        let form = FormController::new(PromptSession::new(backend));
        (ExploreContext::new(Box::new(buffer.clone()), form, location), buffer)
    }

    fn maharashtra() -> ResultBrowser {
        ResultBrowser::new(parse_city_records(SEED_CITIES_JSON).unwrap(), "Maharashtra")
    }

    #[test]
    fn splits_commands_and_arguments() {
        assert_eq!(split_command("/show 3"), ("/show", Some("3")));
        assert_eq!(split_command("/show   Navi Mumbai "), ("/show", Some("Navi Mumbai")));
        assert_eq!(split_command("/back"), ("/back", None));
        assert_eq!(split_command("/locate  "), ("/locate", None));
    }

    #[tokio::test]
    async fn one_shot_prints_the_filtered_grid() {
        let (mut ctx, buffer) = context(ScriptedBackend::replying(SEED_CITIES_JSON));

        assert!(ctx.run_once("Maharashtra", "India", Some("orange")).await.unwrap());

        let output = buffer.contents();
        assert!(output.contains("Explore Maharashtra"));
        assert!(output.contains("Nagpur"));
        assert!(!output.contains("Mumbai"));
    }

    #[tokio::test]
    async fn one_shot_reports_validation_errors() {
        let (mut ctx, buffer) = context(ScriptedBackend::new(vec![]));

        assert!(!ctx.run_once(" ", "", None).await.unwrap());

        let output = buffer.contents();
        assert!(output.contains("State name is required"));
        assert!(output.contains("Country name is required"));
        assert_eq!(ctx.form().session().backend().request_count(), 0);
    }

    #[tokio::test]
    async fn backend_errors_are_shown_and_form_is_kept() {
        let (mut ctx, buffer) = context(ScriptedBackend::failing("API key not valid"));
        ctx.form_mut().set_field(Field::StateName, "Goa");
        ctx.form_mut().set_field(Field::CountryName, "India");

        let browser = ctx.submit_form().await.unwrap();

        assert!(browser.is_none());
        assert!(buffer.contents().contains("API key not valid"));
        assert_eq!(ctx.form().query().state_name, "Goa");
        assert!(!ctx.form().is_loading());
    }

    #[tokio::test]
    async fn reset_command_clears_the_form() {
        let (mut ctx, _buffer) = context(ScriptedBackend::new(vec![]));
        ctx.form_mut().set_field(Field::StateName, "Goa");
        ctx.submit_form().await.unwrap();

        let action = ctx.handle_form_command("/reset").await.unwrap();

        assert_eq!(action, FormAction::Continue);
        assert!(ctx.form().query().state_name.is_empty());
        assert!(ctx.form().errors().is_empty());
    }

    #[tokio::test]
    async fn forget_command_resets_the_conversation() {
        let (mut ctx, _buffer) = context(ScriptedBackend::replying(SEED_CITIES_JSON));
        ctx.run_once("Maharashtra", "India", None).await.unwrap();
        assert_eq!(ctx.form().session().turns().len(), 4);

        ctx.handle_form_command("/forget").await.unwrap();

        assert_eq!(ctx.form().session().turns().len(), 2);
    }

    #[tokio::test]
    async fn bad_coordinates_are_rejected_without_lookup() {
        let (mut ctx, buffer) = context(ScriptedBackend::new(vec![]));

        ctx.handle_form_command("/locate somewhere").await.unwrap();

        let output = buffer.contents();
        assert!(output.contains("LAT,LON"));
        assert!(!output.contains("Detecting"));
    }

    #[tokio::test]
    async fn detected_address_prefills_the_form() {
        let (mut ctx, buffer) = context(ScriptedBackend::new(vec![]));
        let lookup = StubLookup(Ok(Address {
            state: "Kerala".into(),
            country: "India".into(),
        }));

        assert!(ctx.apply_lookup(&lookup).await.unwrap());
        assert_eq!(ctx.form().query().state_name, "Kerala");
        assert!(buffer.contents().contains("Location detected"));
    }

    #[tokio::test]
    async fn location_errors_leave_the_form_alone() {
        let (mut ctx, buffer) = context(ScriptedBackend::new(vec![]));
        ctx.form_mut().set_field(Field::StateName, "Typed");
        let lookup = StubLookup(Err(LocationError::Timeout));

        assert!(!ctx.apply_lookup(&lookup).await.unwrap());
        assert_eq!(ctx.form().query().state_name, "Typed");
        assert!(buffer.contents().contains("timed out"));
    }

    #[test]
    fn results_input_searches_shows_and_goes_back() {
        let (mut ctx, buffer) = context(ScriptedBackend::new(vec![]));
        let mut browser = maharashtra();

        assert_eq!(ctx.handle_results_input(&mut browser, "orange").unwrap(), ResultsAction::Stay);
        assert_eq!(browser.search_term(), "orange");

        ctx.handle_results_input(&mut browser, "/show 1").unwrap();
        assert_eq!(browser.selected().map(|r| r.city.as_str()), Some("Nagpur"));
        assert!(buffer.contents().contains("Historical Background"));

        ctx.handle_results_input(&mut browser, "/close").unwrap();
        assert!(browser.selected().is_none());
        assert_eq!(browser.search_term(), "orange");

        ctx.handle_results_input(&mut browser, "/show Atlantis").unwrap();
        assert!(buffer.contents().contains("No city matches \"Atlantis\""));

        ctx.handle_results_input(&mut browser, "/clear").unwrap();
        assert_eq!(browser.filtered().len(), 10);

        assert_eq!(ctx.handle_results_input(&mut browser, "/back").unwrap(), ResultsAction::Back);
        assert_eq!(ctx.handle_results_input(&mut browser, "/quit").unwrap(), ResultsAction::Quit);
    }

    #[test]
    fn search_term_is_kept_as_typed() {
        let (mut ctx, buffer) = context(ScriptedBackend::new(vec![]));
        let mut browser = maharashtra();

        ctx.handle_results_input(&mut browser, " Orange City ").unwrap();
        assert_eq!(browser.search_term(), " Orange City ");

        // Leading space means a search, not a command.
        assert_eq!(ctx.handle_results_input(&mut browser, " /back").unwrap(), ResultsAction::Stay);
        assert_eq!(browser.search_term(), " /back");

        ctx.handle_results_input(&mut browser, "//km").unwrap();
        assert_eq!(browser.search_term(), "/km");

        ctx.handle_results_input(&mut browser, "").unwrap();
        assert_eq!(browser.search_term(), "/km");

        ctx.handle_results_input(&mut browser, "/help").unwrap();
        assert!(buffer.contents().contains("Lines starting with / are commands"));
    }

    #[tokio::test]
    async fn locate_command_with_coordinates_skips_the_position_service() {
        let mut server = mockito::Server::new_async().await;
        let _reverse = server
            .mock("GET", "/reverse")
            .match_query(mockito::Matcher::UrlEncoded("lat".into(), "15.5".into()))
            .with_status(200)
            .with_body(r#"{"address":{"state":"Goa","country":"India"}}"#)
            .create_async()
            .await;

        let (mut ctx, buffer) = context(ScriptedBackend::new(vec![]));
        ctx.location.geocoder_url = server.url();
        ctx.location.timeout = Duration::from_secs(5);

        ctx.handle_form_command("/locate 15.5,73.8").await.unwrap();

        assert_eq!(ctx.form().query().state_name, "Goa");
        assert_eq!(ctx.form().query().country_name, "India");
        assert!(buffer.contents().contains("Location detected"));
    }

    #[test]
    fn unmatched_search_shows_no_results() {
        let (mut ctx, buffer) = context(ScriptedBackend::new(vec![]));
        let mut browser = maharashtra();

        ctx.handle_results_input(&mut browser, "submarine").unwrap();

        assert!(buffer.contents().contains("No cities found"));
    }
}
