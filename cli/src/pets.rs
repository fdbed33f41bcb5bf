use std::io::{self, Write};

use decoder::{Cat, Dog, Record};

/// What a decoded pet can do.
pub trait Pet {
    fn announce(&self, out: &mut dyn Write) -> io::Result<()>;
    fn act(&self, out: &mut dyn Write) -> io::Result<()>;
}

impl Pet for Cat {
    fn announce(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{} {}", self.name, self.sound)
    }

    fn act(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{} snoozes", self.name)
    }
}

impl Pet for Dog {
    fn announce(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{} the {} barks", self.name, self.breed)
    }

    fn act(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{} the {} plays", self.name, self.breed)
    }
}

impl Pet for Record {
    fn announce(&self, out: &mut dyn Write) -> io::Result<()> {
        match self {
            Record::Cat(cat) => cat.announce(out),
            Record::Dog(dog) => dog.announce(out),
        }
    }

    fn act(&self, out: &mut dyn Write) -> io::Result<()> {
        match self {
            Record::Cat(cat) => cat.act(out),
            Record::Dog(dog) => dog.act(out),
        }
    }
}

/// Let every pet announce itself and act, in order.
pub fn perform(pets: &[Record], out: &mut dyn Write) -> io::Result<()> {
    for pet in pets {
        pet.announce(out)?;
        pet.act(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(pets: &[Record]) -> String {
        let mut out = Vec::new();
        perform(pets, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn cat_says_its_sound_then_snoozes() {
        let pets = [Record::Cat(Cat {
            name: "Ink".into(),
            sound: "meow".into(),
        })];
        assert_eq!(render(&pets), "Ink meow\nInk snoozes\n");
    }

    #[test]
    fn dog_barks_then_plays() {
        let pets = [Record::Dog(Dog {
            name: "Swinney".into(),
            breed: "Dachshund".into(),
        })];
        assert_eq!(
            render(&pets),
            "Swinney the Dachshund barks\nSwinney the Dachshund plays\n"
        );
    }

    #[test]
    fn pets_perform_in_order() {
        let pets = [
            Record::Dog(Dog {
                name: "Spot".into(),
                breed: "Pug".into(),
            }),
            Record::Cat(Cat {
                name: "Neko".into(),
                sound: "nyan".into(),
            }),
        ];
        let output = render(&pets);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines,
            ["Spot the Pug barks", "Spot the Pug plays", "Neko nyan", "Neko snoozes"]
        );
    }
}
