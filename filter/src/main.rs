use std::io::Read;

use structopt::StructOpt;

use sibmail::{SendResult, Transport};

mod email;
mod error;
mod reply;

use error::Error;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "sibmail-filter",
    about = "Postfix filter relaying mail through the Sendinblue API."
)]
struct Opt {
    #[structopt(short, long)]
    sender: String,

    #[structopt(short, long)]
    recipients: Vec<String>,

    /// Config file, defaults to /etc/sibmail/sibmail.toml
    #[structopt(short, long)]
    config: Option<String>,
}

/// Relay the email on stdin to the API
async fn process(opt: Opt) -> Result<SendResult, Error> {
    let settings = sibmail::config::load_settings(opt.config.as_deref())?;
    let transport = Transport::new(&settings)?;

    // Get message body from stdin
    let mut email_content = Vec::new();
    std::io::stdin().read_to_end(&mut email_content)?;

    let mail = email::from_mime(&email_content, opt.sender, opt.recipients)?;

    Ok(transport.send(mail).await?)
}

#[tokio::main]
async fn main() {
    // Init logger
    env_logger::builder().format_timestamp_micros().init();

    let opt = Opt::from_args();

    let code = match process(opt).await {
        Ok(result) => reply::reply_success(&result),
        Err(e) => reply::reply_error(e),
    };

    std::process::exit(code);
}
