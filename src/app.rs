use crate::config::Config;
use crate::resolver::ReferenceInstant;
use crate::skill::AppointmentSkill;
use anyhow::Result;
use chrono_tz::Tz;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

const HELP: &str = "Ask about your calendar, for example:
  do I have an appointment tomorrow?
  what's on the first of december
  anything on friday
  what is my next appointment
  when is my dentist appointment
Type 'exit' or 'quit' to leave.";

pub struct Application {
    skill: AppointmentSkill,
    timezone: Tz,
}

impl Application {
    pub fn new(skill: AppointmentSkill, timezone: Tz) -> Self {
        Self { skill, timezone }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let timezone = config.calendar.timezone()?;
        let skill = AppointmentSkill::from_config(config)?;
        log::debug!("Skill set up with {:?} in {}", config.skill, timezone);
        Ok(Self::new(skill, timezone))
    }

    /// Answer a single question and return the reply
    pub async fn ask(&self, utterance: &str) -> String {
        let reference = ReferenceInstant::now_in(&self.timezone);
        self.skill.handle(utterance, &reference).await
    }

    pub async fn run(&self) -> Result<()> {
        log::info!("Starting calendar prompt");
        let mut rl = DefaultEditor::new()?;

        println!("Ask me about your appointments. Type 'help' for examples.");
        let prompt = "📅 ";

        loop {
            match rl.readline(prompt) {
                Ok(line) => {
                    let _ = rl.add_history_entry(line.as_str());
                    if !self.process_input(&line).await {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    println!("Error: {:?}", err);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle one line of input; false means the user wants to leave
    async fn process_input(&self, input: &str) -> bool {
        let trimmed = input.trim();
        match trimmed.to_lowercase().as_str() {
            "" => true,
            "exit" | "quit" => {
                log::info!("Exit command received");
                false
            }
            "help" => {
                println!("{}", HELP);
                true
            }
            _ => {
                println!("{}", self.ask(trimmed).await);
                true
            }
        }
    }
}
