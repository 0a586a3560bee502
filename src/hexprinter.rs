use std::io::{self, Write};

use ansi_term::{Color, Style};

/// Colored hex/ASCII dump writer, one line per `cols` bytes with labels on the right.
pub struct HexPrinter<W: Write> {
    cols: u64,
    break_on_bounds: bool,
    color: bool,
    bytes: Vec<Option<(u8, u8, u8)>>,
    labels: Vec<(String, Style)>,
    line_addr: u64,
    last_line_addr: Option<u64>,
    printer: ColorPrinter<W>,
    has_data: bool,
    /// Set once a line ends at the top of the address space; bytes are dropped until `set_addr`.
    wrapped: bool,
}

impl<W: Write> HexPrinter<W> {
    pub fn new(out: W, cols: u64, break_on_bounds: bool, color: bool) -> Self {
        Self {
            cols: cols.max(1),
            break_on_bounds,
            color,
            bytes: Vec::new(),
            labels: Vec::new(),
            line_addr: 0,
            last_line_addr: None,
            printer: ColorPrinter::new(out),
            has_data: false,
            wrapped: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.printer.out
    }

    fn style(&self, style: Style) -> Style {
        if self.color {
            style
        } else {
            Style::default()
        }
    }

    pub fn flush_line(&mut self) -> io::Result<()> {
        if !self.has_data {
            return Ok(());
        }
        self.flush_line_force()
    }

    pub fn flush_line_force(&mut self) -> io::Result<()> {
        while self.bytes.len() < self.cols as usize {
            self.bytes.push(None);
        }

        let plain = Style::default();
        if self.last_line_addr.is_some_and(|v| self.line_addr == v) {
            self.printer.print("           | ", plain)?;
        } else {
            self.printer
                .print(&format!("{:#010x} | ", self.line_addr), plain)?;
        }
        self.last_line_addr = Some(self.line_addr);

        for i in 0..self.cols as usize {
            match self.bytes[i] {
                Some((byte, fg, bg)) => {
                    let style = self.style(plain.fg(Color::Fixed(fg)).on(Color::Fixed(bg)));
                    self.printer.print(&format!("{:02x} ", byte), style)?;
                }
                None => self.printer.print("   ", plain)?,
            }
            if self.cols % 8 == 0 && (i + 1) % 8 == 0 {
                self.printer.print(" ", plain)?;
            }
        }
        self.printer.print("| ", plain)?;
        for i in 0..self.cols as usize {
            match self.bytes[i] {
                Some((byte, fg, bg)) => {
                    let style =
                        self.style(plain.bold().fg(Color::Fixed(fg)).on(Color::Fixed(bg)));
                    if byte.is_ascii_graphic() {
                        self.printer.print(&format!("{}", byte as char), style)?;
                    } else {
                        self.printer.print(".", style)?;
                    }
                }
                None => self.printer.print(" ", plain)?,
            }
        }
        self.printer.print(" |", plain)?;
        let color = self.color;
        for (label, style) in self.labels.iter() {
            self.printer.print(" ", plain)?;
            self.printer.print(label, if color { *style } else { plain })?;
        }
        self.printer.print("", plain)?;
        writeln!(self.printer.out)?;

        self.bytes.clear();
        self.labels.clear();
        self.has_data = false;
        Ok(())
    }

    pub fn push_byte(&mut self, byte: u8, fg: u8, bg: u8) -> io::Result<()> {
        if self.wrapped {
            return Ok(());
        }
        self.bytes.push(Some((byte, fg, bg)));
        self.has_data = true;
        if self.bytes.len() == self.cols as usize {
            self.flush_line()?;
            match self.line_addr.checked_add(self.cols) {
                Some(next) => self.line_addr = next,
                None => self.wrapped = true,
            }
        }
        Ok(())
    }

    pub fn set_addr(&mut self, addr: u64) -> io::Result<()> {
        self.wrapped = false;
        let base = addr / self.cols * self.cols;
        let col = addr % self.cols;
        if base != self.line_addr {
            if !self.bytes.is_empty() {
                self.flush_line()?;
            }
            if self.last_line_addr.is_some() && base > self.line_addr.saturating_add(self.cols) {
                writeln!(self.printer.out, "...")?;
            }
            self.line_addr = base;
        }
        if (col as usize) < self.bytes.len() {
            self.flush_line()?;
            self.bytes.clear();
        }
        while self.bytes.len() < col as usize {
            self.bytes.push(None);
        }
        Ok(())
    }

    pub fn add_label(&mut self, label: String, style: Style) {
        self.labels.push((label, style));
        self.has_data = true;
    }

    pub fn bound(&mut self) -> io::Result<()> {
        if self.break_on_bounds {
            self.flush_line()?;
        }
        Ok(())
    }
}

struct ColorPrinter<W: Write> {
    out: W,
    last_style: Style,
}

impl<W: Write> ColorPrinter<W> {
    fn new(out: W) -> Self {
        Self {
            out,
            last_style: Style::default(),
        }
    }

    fn print(&mut self, s: &str, style: Style) -> io::Result<()> {
        if self.last_style != style {
            write!(self.out, "{}", self.last_style.infix(style))?;
            self.last_style = style;
        }
        write!(self.out, "{}", s)
    }
}
