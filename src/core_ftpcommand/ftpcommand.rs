#[derive(Eq, Hash, PartialEq, Debug, Clone, Copy)]
pub enum FtpCommand {
    USER,
    PASS,
    SYST,
    FEAT,
    PWD,
    CWD,
    CDUP,
    TYPE,
    PASV,
    LIST,
    RETR,
    STOR,
    DELE,
    MKD,
    RMD,
    RNFR,
    RNTO,
    SIZE,
    NOOP,
    OPTS,
    QUIT,
}

impl FtpCommand {
    pub fn from_str(cmd: &str) -> Option<FtpCommand> {
        match cmd.to_ascii_uppercase().as_str() {
            "USER" => Some(FtpCommand::USER),
            "PASS" => Some(FtpCommand::PASS),
            "SYST" => Some(FtpCommand::SYST),
            "FEAT" => Some(FtpCommand::FEAT),
            "PWD" => Some(FtpCommand::PWD),
            "CWD" => Some(FtpCommand::CWD),
            "CDUP" => Some(FtpCommand::CDUP),
            "TYPE" => Some(FtpCommand::TYPE),
            "PASV" => Some(FtpCommand::PASV),
            "LIST" => Some(FtpCommand::LIST),
            "RETR" => Some(FtpCommand::RETR),
            "STOR" => Some(FtpCommand::STOR),
            "DELE" => Some(FtpCommand::DELE),
            "MKD" => Some(FtpCommand::MKD),
            "RMD" => Some(FtpCommand::RMD),
            "RNFR" => Some(FtpCommand::RNFR),
            "RNTO" => Some(FtpCommand::RNTO),
            "SIZE" => Some(FtpCommand::SIZE),
            "NOOP" => Some(FtpCommand::NOOP),
            "OPTS" => Some(FtpCommand::OPTS),
            "QUIT" => Some(FtpCommand::QUIT),
            _ => None,
        }
    }
}

/// Splits a control line at its first space.
///
/// The command token comes back uppercased. Everything after the first space
/// is the argument, spaces included, so `STOR my file.txt` names `my file.txt`.
pub fn parse_command_line(line: &str) -> (String, String) {
    let line = line.trim_start();
    match line.split_once(' ') {
        Some((cmd, arg)) => (cmd.to_ascii_uppercase(), arg.to_string()),
        None => (line.to_ascii_uppercase(), String::new()),
    }
}
