use crate::core_ftpcommand::ftpcommand::FtpCommand;
use crate::helpers::ControlWriter;
use crate::session::Session;
use crate::Config;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex as TokioMutex;

use crate::core_network::pasv;

pub type CommandHandler = Box<
    dyn Fn(
            ControlWriter,
            Arc<Config>,
            Arc<TokioMutex<Session>>,
            String,
        ) -> HandlerFuture
        + Send
        + Sync,
>;

pub type CommandHandlers = HashMap<FtpCommand, CommandHandler>;

type HandlerFuture = Pin<Box<dyn Future<Output = Result<(), std::io::Error>> + Send>>;

fn boxed<F, Fut>(handler: F) -> CommandHandler
where
    F: Fn(ControlWriter, Arc<Config>, Arc<TokioMutex<Session>>, String) -> Fut
        + Send
        + Sync
        + 'static,
    Fut: Future<Output = Result<(), std::io::Error>> + Send + 'static,
{
    Box::new(
        move |writer: ControlWriter,
              config: Arc<Config>,
              session: Arc<TokioMutex<Session>>,
              arg: String|
              -> HandlerFuture { Box::pin(handler(writer, config, session, arg)) },
    )
}

pub fn initialize_command_handlers() -> CommandHandlers {
    let mut handlers: CommandHandlers = HashMap::new();

    handlers.insert(
        FtpCommand::USER,
        boxed(crate::core_ftpcommand::user::handle_user_command),
    );
    handlers.insert(
        FtpCommand::PASS,
        boxed(crate::core_ftpcommand::pass::handle_pass_command),
    );
    handlers.insert(
        FtpCommand::SYST,
        boxed(crate::core_ftpcommand::syst::handle_syst_command),
    );
    handlers.insert(
        FtpCommand::FEAT,
        boxed(crate::core_ftpcommand::feat::handle_feat_command),
    );
    handlers.insert(
        FtpCommand::PWD,
        boxed(crate::core_ftpcommand::pwd::handle_pwd_command),
    );
    handlers.insert(
        FtpCommand::CWD,
        boxed(crate::core_ftpcommand::cwd::handle_cwd_command),
    );
    handlers.insert(
        FtpCommand::CDUP,
        boxed(crate::core_ftpcommand::cdup::handle_cdup_command),
    );
    handlers.insert(
        FtpCommand::TYPE,
        boxed(crate::core_ftpcommand::type_::handle_type_command),
    );
    handlers.insert(FtpCommand::PASV, boxed(pasv::handle_pasv_command));
    handlers.insert(
        FtpCommand::LIST,
        boxed(crate::core_ftpcommand::list::handle_list_command),
    );
    handlers.insert(
        FtpCommand::RETR,
        boxed(crate::core_ftpcommand::retr::handle_retr_command),
    );
    handlers.insert(
        FtpCommand::STOR,
        boxed(crate::core_ftpcommand::stor::handle_stor_command),
    );
    handlers.insert(
        FtpCommand::DELE,
        boxed(crate::core_ftpcommand::dele::handle_dele_command),
    );
    handlers.insert(
        FtpCommand::MKD,
        boxed(crate::core_ftpcommand::mkd::handle_mkd_command),
    );
    handlers.insert(
        FtpCommand::RMD,
        boxed(crate::core_ftpcommand::rmd::handle_rmd_command),
    );
    handlers.insert(
        FtpCommand::RNFR,
        boxed(crate::core_ftpcommand::rnfr::handle_rnfr_command),
    );
    handlers.insert(
        FtpCommand::RNTO,
        boxed(crate::core_ftpcommand::rnto::handle_rnto_command),
    );
    handlers.insert(
        FtpCommand::SIZE,
        boxed(crate::core_ftpcommand::size::handle_size_command),
    );
    handlers.insert(
        FtpCommand::NOOP,
        boxed(crate::core_ftpcommand::noop::handle_noop_command),
    );
    handlers.insert(
        FtpCommand::OPTS,
        boxed(crate::core_ftpcommand::opts::handle_opts_command),
    );
    handlers.insert(
        FtpCommand::QUIT,
        boxed(crate::core_ftpcommand::quit::handle_quit_command),
    );

    handlers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_command_has_a_handler() {
        let handlers = initialize_command_handlers();
        for cmd in [
            "USER", "PASS", "SYST", "FEAT", "PWD", "CWD", "CDUP", "TYPE", "PASV", "LIST", "RETR",
            "STOR", "DELE", "MKD", "RMD", "RNFR", "RNTO", "SIZE", "NOOP", "OPTS", "QUIT",
        ] {
            let command = FtpCommand::from_str(cmd).unwrap();
            assert!(handlers.contains_key(&command), "missing handler for {}", cmd);
        }
    }
}
