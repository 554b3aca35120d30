pub trait Peek: Iterator {
    fn peek(&self) -> Option<Self::Item>;

    fn eat<P>(&mut self, pat: P) -> bool
    where
        Self::Item: PartialEq<P>,
    {
        self.eat_where(|item| *item == pat)
    }

    fn eat_where(&mut self, pred: impl FnOnce(&Self::Item) -> bool) -> bool {
        match self.peek() {
            Some(item) if pred(&item) => {
                self.next();
                true
            }
            _ => false,
        }
    }

    fn at_end(&self) -> bool {
        self.peek().is_none()
    }
}

impl<P: Peek> Peek for &mut P {
    fn peek(&self) -> Option<Self::Item> {
        (**self).peek()
    }
}

impl Peek for std::str::Chars<'_> {
    fn peek(&self) -> Option<Self::Item> {
        self.clone().next()
    }
}
