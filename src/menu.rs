//! The interactive program: a loop over `Screen`s, each of which reads input and names the next.

use crate::console::Console;
use crate::error::{error_type, ErrorType};
use crate::gateway::Gateway;
use crate::model::Expenses;
use crate::record::{collect_expense, confirm, Decision};
use crate::view::{category_totals, render_category_totals, render_in_order, unreadable_rows};
use crate::Result;
use chrono::{Local, NaiveDate};
use std::io::{BufRead, Write};
use tracing::{debug, info, warn};

const BANNER: &str = r#"
    888888ba                 dP                     dP
    88    `8b                88                     88
   a88aaaa8P' dP    dP .d888b88 .d8888b. .d8888b. d8888P
    88   `8b. 88    88 88'  `88 88'  `88 88ooood8   88
    88    .88 88.  .88 88.  .88 88.  .88 88.  ...   88
    88888888P `88888P' `88888P8 `8888P88 `88888P'   dP
                                    .88
                                d8888P

    888888ba                 dP       dP
    88    `8b                88       88
   a88aaaa8P' dP    dP .d888b88 .d888b88 dP    dP
    88   `8b. 88    88 88'  `88 88'  `88 88    88
    88    .88 88.  .88 88.  .88 88.  .88 88.  .88
    88888888P `88888P' `88888P8 `88888P8 `8888P88
                                            .88
                                        d8888P
"#;

const SELECT_OPTION: &str = "Please select one of the following options:";
const LOADING: &str = "Loading...";
const LOADING_EXPENSES: &str = "Loading Expenses...";
const LOADING_MAIN_MENU: &str = "Loading Main Menu...";
const INVALID_MENU_OPTION: &str = "Invalid input: Please select one of the options (1-3).";
const STORE_UNAVAILABLE: &str =
    "The expense sheet could not be reached. Please check your connection and try again.";

/// Where the user is in the program.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Screen {
    MainMenu,
    AddExpense,
    ViewMenu,
    ViewInOrder,
    ViewByCategory,
    Exit,
}

impl Screen {
    /// The menu to fall back to when this screen cannot finish.
    fn parent(self) -> Screen {
        match self {
            Screen::MainMenu | Screen::AddExpense | Screen::ViewMenu => Screen::MainMenu,
            Screen::ViewInOrder | Screen::ViewByCategory => Screen::ViewMenu,
            Screen::Exit => Screen::Exit,
        }
    }
}

pub struct App<R, W> {
    console: Console<R, W>,
    gateway: Gateway,
    today: Option<NaiveDate>,
}

impl<R, W> App<R, W>
where
    R: BufRead,
    W: Write,
{
    pub fn new(console: Console<R, W>, gateway: Gateway) -> Self {
        Self {
            console,
            gateway,
            today: None,
        }
    }

    /// Pins the date that entered dates are checked against instead of using the local date.
    #[cfg(test)]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    #[cfg(test)]
    pub fn console(&self) -> &Console<R, W> {
        &self.console
    }

    /// Shows the banner and runs menus until the user exits or the input is closed.
    ///
    /// # Errors
    /// Returns the error that stopped the program if it is one that retrying cannot fix, e.g. the
    /// credentials were rejected.
    pub async fn run(&mut self) -> Result<()> {
        self.banner()?;
        let mut screen = Screen::MainMenu;
        while screen != Screen::Exit {
            debug!("Showing {screen:?}");
            screen = match self.show(screen).await {
                Ok(next) => next,
                Err(e) => match error_type(&e) {
                    Some(ErrorType::InputClosed) => {
                        info!("Input closed, leaving the program");
                        self.console.newline()?;
                        return Ok(());
                    }
                    Some(ErrorType::Transient) => {
                        warn!("Giving up on {screen:?}: {e:#}");
                        self.console.error(STORE_UNAVAILABLE)?;
                        screen.parent()
                    }
                    _ => return Err(e),
                },
            };
        }
        Ok(())
    }

    async fn show(&mut self, screen: Screen) -> Result<Screen> {
        match screen {
            Screen::MainMenu => self.main_menu(),
            Screen::AddExpense => self.add_expense().await,
            Screen::ViewMenu => self.view_menu(),
            Screen::ViewInOrder => self.view_in_order().await,
            Screen::ViewByCategory => self.view_by_category().await,
            Screen::Exit => Ok(Screen::Exit),
        }
    }

    fn banner(&mut self) -> Result<()> {
        self.console.newline()?;
        self.console.rule()?;
        self.console.green(BANNER)?;
        self.console.rule()?;
        self.console.pause(2);
        self.console.clear()
    }

    fn main_menu(&mut self) -> Result<Screen> {
        self.console.newline()?;
        self.console.heading("MAIN MENU")?;
        self.console.say(SELECT_OPTION)?;
        self.console.newline()?;
        self.console
            .options(&["Add Expenses", "View Expenses", "Exit"])?;
        self.console.newline()?;
        match self.console.read_line()?.trim() {
            "1" => {
                self.console.transition(LOADING)?;
                Ok(Screen::AddExpense)
            }
            "2" => {
                self.console.transition(LOADING)?;
                Ok(Screen::ViewMenu)
            }
            "3" => {
                self.console.newline()?;
                self.console.say("Exiting...")?;
                self.console.pause(1);
                Ok(Screen::Exit)
            }
            _ => {
                self.console.error(INVALID_MENU_OPTION)?;
                Ok(Screen::MainMenu)
            }
        }
    }

    async fn add_expense(&mut self) -> Result<Screen> {
        let expense = loop {
            self.console.heading("ADD EXPENSES")?;
            self.console.say("Please add expense details below.")?;
            self.console.newline()?;
            self.console.rule()?;
            self.console.newline()?;
            let today = self.today();
            let expense = collect_expense(&mut self.console, today)?;
            match confirm(&mut self.console, &expense)? {
                Decision::Confirm => break expense,
                Decision::Reenter => {
                    debug!("Discarding {expense:?}");
                    self.console.pause(1);
                    self.console.clear()?;
                }
            }
        };

        self.console.newline()?;
        self.console.say("Updating worksheet...")?;
        self.gateway.append(&expense).await?;
        self.console.newline()?;
        self.console.say("Worksheet updated successfully.")?;
        self.console.newline()?;
        self.console
            .say("Add another expense (a) or return to main menu (m)?")?;
        self.console.newline()?;

        loop {
            match self.console.read_line()?.trim().to_lowercase().as_str() {
                "a" => {
                    self.console.pause(1);
                    self.console.clear()?;
                    return Ok(Screen::AddExpense);
                }
                "m" => {
                    self.console.transition(LOADING_MAIN_MENU)?;
                    return Ok(Screen::MainMenu);
                }
                _ => self.console.error(
                    "Invalid input: Please enter (a) to add another expense or (m) to return to \
                    the main menu.",
                )?,
            }
        }
    }

    fn view_menu(&mut self) -> Result<Screen> {
        self.console.newline()?;
        self.console.heading("VIEW EXPENSES")?;
        self.console.say(SELECT_OPTION)?;
        self.console.newline()?;
        self.console
            .options(&["View in Order", "View by Category", "Return to Main Menu"])?;
        self.console.newline()?;
        match self.console.read_line()?.trim() {
            "1" => {
                self.console.transition(LOADING_EXPENSES)?;
                Ok(Screen::ViewInOrder)
            }
            "2" => {
                self.console.transition(LOADING_EXPENSES)?;
                Ok(Screen::ViewByCategory)
            }
            "3" => {
                self.console.transition(LOADING_MAIN_MENU)?;
                Ok(Screen::MainMenu)
            }
            _ => {
                self.console.error(INVALID_MENU_OPTION)?;
                Ok(Screen::ViewMenu)
            }
        }
    }

    async fn view_in_order(&mut self) -> Result<Screen> {
        let expenses = Expenses::parse(self.gateway.read_all().await?);
        self.console.line("Displaying Expenses")?;
        self.console.newline()?;
        self.console.rule()?;
        self.console.newline()?;
        self.console.line(&render_in_order(&expenses))?;
        self.console.rule()?;
        self.back_to_main_menu()
    }

    async fn view_by_category(&mut self) -> Result<Screen> {
        let expenses = Expenses::parse(self.gateway.read_all().await?);
        self.console.line("Displaying Category Totals")?;
        self.console.newline()?;
        self.console.rule()?;
        self.console.newline()?;
        self.console
            .line(&render_category_totals(&category_totals(&expenses)))?;
        let skipped = unreadable_rows(&expenses);
        if skipped > 0 {
            self.console.newline()?;
            self.console.line(&format!(
                "{skipped} row(s) in the sheet could not be read and were left out."
            ))?;
        }
        self.console.rule()?;
        self.back_to_main_menu()
    }

    fn back_to_main_menu(&mut self) -> Result<Screen> {
        self.console.newline()?;
        self.console
            .say("To return to the main menu, please enter (m).")?;
        loop {
            if self.console.read_line()?.trim().eq_ignore_ascii_case("m") {
                self.console.transition(LOADING_MAIN_MENU)?;
                return Ok(Screen::MainMenu);
            }
            self.console
                .error("Invalid input: Please enter (m) to return to the main menu.")?;
        }
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}
