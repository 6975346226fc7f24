//! Terminal front-end state for Daily School.
//!
//! `App` wraps the shared `AppContext` and turns each screen of the client
//! (sign-up, sign-in, writing, news view, newsletter) into prompts and plain
//! text output. Failures become a one-line message and never end the
//! interactive shell.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use tracing::{error, info, warn};

use dailyschool_core::models::{Category, NewsDraft};
use dailyschool_core::{
    ApiError, AppContext, Config, ContextError, KeyringTokenStore, MemoryTokenStore, TokenStore,
};

use crate::commands::ShellCommand;

/// Maximum length for email input.
const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

const SHELL_PROMPT: &str = "> ";

pub struct App {
    ctx: AppContext,
    config: Config,
    ephemeral: bool,
}

impl App {
    pub fn new(config: Config, ephemeral: bool) -> Result<Self> {
        let tokens: Arc<dyn TokenStore> = if ephemeral {
            Arc::new(MemoryTokenStore::new())
        } else {
            Arc::new(KeyringTokenStore::new())
        };
        let ctx = AppContext::new(config.clone(), tokens).context("Failed to create API client")?;
        Ok(Self {
            ctx,
            config,
            ephemeral,
        })
    }

    /// Mount the app context, restoring any stored session.
    pub async fn start(&mut self) -> Result<()> {
        self.ctx.mount().await.context("Failed to restore session")?;
        Ok(())
    }

    pub fn stop(&mut self) {
        self.ctx.unmount();
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub async fn sign_up(&mut self, email: Option<String>, name: Option<String>) -> Result<()> {
        let email = Self::required(email, "Email")?;
        let name = Self::required(name, "Name")?;
        let password = Self::prompt_password()?;

        match self.ctx.sign_up(&email, &name, &password).await {
            Ok(envelope) => {
                info!(email = %email, "Sign-up accepted");
                println!("회원가입이 완료되었습니다.");
                if let Some(message) = envelope.message() {
                    println!("{}", message);
                }
                Ok(())
            }
            Err(e) => Err(Self::report("회원가입에 실패했습니다", e)),
        }
    }

    pub async fn login(&mut self, email: Option<String>) -> Result<()> {
        let email = match email {
            Some(email) => email,
            None => {
                let typed = Self::prompt_line(&Self::email_prompt(self.config.last_email.as_deref()))?;
                Self::email_or_default(typed, self.config.last_email.as_deref())
            }
        };
        Self::check_length(&email, "Email", MAX_EMAIL_LENGTH)?;
        let password = Self::prompt_password()?;

        let greeting = match self.ctx.sign_in(&email, &password).await {
            Ok(user) => user.display_name(),
            Err(e) => return Err(Self::report_with("로그인에 실패했습니다", e, Self::sign_in_message)),
        };
        println!("로그인되었습니다. {}님 환영합니다.", greeting);

        if !self.ephemeral {
            self.config.last_email = Some(email);
            if let Err(e) = self.config.save() {
                warn!(error = %e, "Failed to save config");
            }
        }
        Ok(())
    }

    pub fn logout(&mut self) -> Result<()> {
        match self.ctx.logout() {
            Ok(()) => {
                println!("로그아웃되었습니다.");
                Ok(())
            }
            Err(e) => Err(Self::report("로그아웃에 실패했습니다", e)),
        }
    }

    pub fn whoami(&self) -> Result<()> {
        match self.ctx.session()?.user() {
            Some(user) => println!("{}", user.display_name()),
            None => println!("로그인되어 있지 않습니다."),
        }
        Ok(())
    }

    // =========================================================================
    // Announcements
    // =========================================================================

    pub async fn post(&mut self, title: Option<String>, content: Option<String>, category: Category) -> Result<()> {
        if !self.ctx.session()?.is_authenticated() {
            return Err(Self::report("소식 등록에 실패했습니다", ContextError::NotAuthenticated));
        }

        let title = Self::required(title, "Title")?;
        let content = match content {
            Some(content) => content,
            None => Self::prompt_multiline("Content")?,
        };

        match self.ctx.submit(NewsDraft::new(title, content, category)).await {
            Ok(item) => {
                println!("소식이 등록되었습니다. [{}] {}", item.category, item.title);
                Ok(())
            }
            Err(e) => Err(Self::report("소식 등록에 실패했습니다. 다시 시도해주세요", e)),
        }
    }

    pub fn print_news(&self) {
        print!("{}", Self::render_news(&self.ctx));
    }

    fn render_news(ctx: &AppContext) -> String {
        let groups = ctx.board().grouped();
        if groups.is_empty() {
            return "등록된 소식이 없습니다.\n".to_string();
        }

        let mut out = String::new();
        for group in groups {
            out.push_str(&format!("\n[{}]\n", group.category));
            for item in group.items {
                out.push_str(&format!("- {} ({})\n", item.title, item.timestamp_display()));
                for line in item.content.lines() {
                    out.push_str(&format!("    {}\n", line));
                }
            }
        }
        out
    }

    pub fn print_newsletter(&self, date: Option<NaiveDate>) {
        let date = date.unwrap_or_else(|| Local::now().date_naive());
        print!("{}", self.ctx.newsletter(date).render());
    }

    // =========================================================================
    // Interactive Shell
    // =========================================================================

    /// Read commands until `quit` or end of input. Announcements posted here
    /// live until the shell exits.
    pub async fn run_shell(&mut self) -> Result<()> {
        self.print_banner()?;

        loop {
            print!("{}", SHELL_PROMPT);
            io::stdout().flush()?;

            let mut input = String::new();
            if io::stdin().lock().read_line(&mut input)? == 0 {
                break;
            }
            if input.trim().is_empty() {
                continue;
            }

            let command = match ShellCommand::parse_line(&input) {
                Ok(command) => command,
                Err(e) => {
                    eprintln!("{}", e);
                    continue;
                }
            };

            let result = match command {
                ShellCommand::Signup => self.sign_up(None, None).await,
                ShellCommand::Login { email } => self.login(email).await,
                ShellCommand::Logout => self.logout(),
                ShellCommand::Whoami => self.whoami(),
                ShellCommand::Post { category } => self.post(None, None, category).await,
                ShellCommand::News => {
                    self.print_news();
                    Ok(())
                }
                ShellCommand::Newsletter { date } => {
                    self.print_newsletter(date);
                    Ok(())
                }
                ShellCommand::Quit => break,
            };
            if let Err(e) = result {
                eprintln!("{}", e);
            }
        }
        Ok(())
    }

    fn print_banner(&self) -> Result<()> {
        println!("데일리스쿨 - 너만 모르는 학교 소식");
        match self.ctx.session()?.user() {
            Some(user) => println!("{}님으로 로그인되어 있습니다.", user.display_name()),
            None => println!("'login' 또는 'signup'으로 시작하세요. 'help'로 명령어를 볼 수 있습니다."),
        }
        Ok(())
    }

    // =========================================================================
    // Reporting and Prompts
    // =========================================================================

    /// Log the underlying failure and turn it into a one-line user message.
    fn report(action: &str, err: ContextError) -> anyhow::Error {
        Self::report_with(action, err, Self::user_message)
    }

    fn report_with(action: &str, err: ContextError, describe: fn(&ContextError) -> String) -> anyhow::Error {
        error!(error = %err, action = action, "Request failed");
        anyhow::anyhow!("{}: {}", action, describe(&err))
    }

    /// A 401 from the sign-in endpoint means the credentials were rejected.
    fn sign_in_message(err: &ContextError) -> String {
        match err {
            ContextError::Api(ApiError::Unauthorized) => {
                "이메일 또는 비밀번호가 올바르지 않습니다.".to_string()
            }
            other => Self::user_message(other),
        }
    }

    /// Short explanation of a failure for the person at the keyboard.
    fn user_message(err: &ContextError) -> String {
        match err {
            ContextError::NotAuthenticated => "먼저 로그인해주세요.".to_string(),
            ContextError::Board(e) => e.to_string(),
            ContextError::Api(ApiError::Unauthorized) => {
                "권한이 거부되었습니다. 다시 로그인해주세요.".to_string()
            }
            ContextError::Api(ApiError::RefreshFailed(_)) | ContextError::Api(ApiError::NoRefreshToken) => {
                "세션이 만료되었습니다. 다시 로그인해주세요.".to_string()
            }
            ContextError::Api(ApiError::MissingTokens) => {
                "서버 응답에 인증 정보가 없습니다.".to_string()
            }
            ContextError::Api(ApiError::NetworkError(e)) if e.is_timeout() => {
                "요청 시간이 초과되었습니다. 다시 시도해주세요.".to_string()
            }
            ContextError::Api(ApiError::NetworkError(_)) => {
                "서버에 연결할 수 없습니다. 인터넷 연결을 확인해주세요.".to_string()
            }
            other => other.to_string(),
        }
    }

    fn required(value: Option<String>, label: &str) -> Result<String> {
        let value = match value {
            Some(value) => value,
            None => Self::prompt_line(label)?,
        };
        if value.trim().is_empty() {
            anyhow::bail!("{} is required", label);
        }
        Ok(value)
    }

    fn check_length(value: &str, label: &str, max: usize) -> Result<()> {
        if value.trim().is_empty() {
            anyhow::bail!("{} is required", label);
        }
        if value.chars().count() > max {
            anyhow::bail!("{} must be at most {} characters", label, max);
        }
        Ok(())
    }

    fn email_prompt(last_email: Option<&str>) -> String {
        match last_email {
            Some(last) => format!("Email [{}]", last),
            None => "Email".to_string(),
        }
    }

    /// An empty answer accepts the previously used email.
    fn email_or_default(typed: String, last_email: Option<&str>) -> String {
        match last_email {
            Some(last) if typed.is_empty() => last.to_string(),
            _ => typed,
        }
    }

    fn prompt_line(label: &str) -> Result<String> {
        print!("{}: ", label);
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    /// Read lines until an empty line.
    fn prompt_multiline(label: &str) -> Result<String> {
        println!("{} (finish with an empty line):", label);
        let stdin = io::stdin();
        let mut lines = Vec::new();
        for line in stdin.lock().lines() {
            let line = line?;
            if line.trim().is_empty() {
                break;
            }
            lines.push(line);
        }
        Ok(lines.join("\n"))
    }

    fn prompt_password() -> Result<String> {
        let password = rpassword::prompt_password("Password: ")?;
        Self::check_length(&password, "Password", MAX_PASSWORD_LENGTH)?;
        Ok(password)
    }
}
