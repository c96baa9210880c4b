use crate::error::{MonitorError, Result};
use std::fs;
use std::path::Path;

/// Процесс из /proc
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    /// Имя из /proc/<pid>/comm (ядро обрезает его до 15 символов)
    pub comm: String,
    /// Первый аргумент командной строки. Под Wine это Windows путь вида `C:\...\Game.exe`
    pub argv0: Option<String>,
}

impl ProcessInfo {
    pub fn new(pid: u32, comm: impl Into<String>) -> Self {
        Self {
            pid,
            comm: comm.into(),
            argv0: None,
        }
    }

    pub fn with_argv0(mut self, argv0: impl Into<String>) -> Self {
        self.argv0 = Some(argv0.into());
        self
    }

    /// Имя исполняемого файла из argv[0], разделители и `/`, и `\`
    pub fn executable_name(&self) -> Option<&str> {
        let argv0 = self.argv0.as_deref()?;
        argv0.rsplit(['/', '\\']).next().filter(|name| !name.is_empty())
    }

    /// Точное совпадение имени исполняемого файла
    pub fn matches(&self, process_name: &str) -> bool {
        self.comm == process_name || self.executable_name() == Some(process_name)
    }
}

/// Прочитать список процессов. Ошибка только если недоступен сам каталог.
/// Процессы, завершившиеся во время обхода, молча пропускаются.
pub fn scan_processes(proc_root: &Path) -> Result<Vec<ProcessInfo>> {
    let entries = fs::read_dir(proc_root).map_err(|e| {
        MonitorError::Enumeration(format!("Не удалось прочитать {:?}: {}", proc_root, e))
    })?;

    let mut processes = Vec::new();

    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let Some(pid) = file_name.to_str().and_then(|name| name.parse::<u32>().ok()) else {
            continue;
        };

        let dir = entry.path();
        let Ok(comm) = fs::read_to_string(dir.join("comm")) else {
            continue;
        };

        let mut info = ProcessInfo::new(pid, comm.trim_end_matches('\n'));

        if let Ok(cmdline) = fs::read(dir.join("cmdline")) {
            if let Some(first) = cmdline.split(|b| *b == 0).next().filter(|arg| !arg.is_empty()) {
                info = info.with_argv0(String::from_utf8_lossy(first));
            }
        }

        processes.push(info);
    }

    Ok(processes)
}
