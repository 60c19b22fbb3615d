//! The panic handler. Same ASCII banner as the source's
//! `lang_items.rs`, logged through [`crate::log::set_panic_writer`]
//! instead of a global console, then a halt loop — there is nowhere
//! left to hand control back to once a panic has unwound this far.

use core::fmt::Write as _;

const BANNER: &str = r#"            (
        (      )     )
          )   (    (
         (          `
     .-""^"""^""^"""^""-.
   (//\\//\\//\\//\\//\\//)
    ~\^^^^^^^^^^^^^^^^^^/~
      `================`

     The pi is overdone.

 ---------- PANIC ----------
"#;

struct PanicWriter;

impl core::fmt::Write for PanicWriter {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        crate::log::panic_write(s);
        Ok(())
    }
}

#[cfg(not(test))]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    let mut w = PanicWriter;
    let _ = write!(w, "{}", BANNER);
    let _ = write!(w, "\n{}\n", info);
    loop {
        core::hint::spin_loop();
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::string::String;

    #[test]
    fn banner_names_the_pi() {
        let mut rendered = String::new();
        core::fmt::Write::write_str(&mut rendered, super::BANNER).unwrap();
        assert!(rendered.contains("The pi is overdone."));
        assert!(rendered.contains("PANIC"));
    }
}
